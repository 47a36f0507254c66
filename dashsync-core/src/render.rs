//! Projecting the model into the dashboard view.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::collect::{
    BADGE_CLASS, DATE_LINE_CLASS, HIGH_PRIORITY_CLASS, NAME_CLASS, NEWS_AUTHOR_CLASS,
    NEWS_DATE_CLASS, NEWS_EXCERPT_CLASS, NEWS_TITLE_CLASS,
};
use crate::constants::{ANNIVERSARY_ITEM_CLASS, LABEL_SEPARATOR, NEWS_ITEM_CLASS, TODAY_MARKER};
use crate::dates::{date_phrase, is_today};
use crate::error::{DashError, DashResult};
use crate::model::{CompanyAnniversary, Model, NewsItem, PersonalBirthday, Priority};
use crate::view::anchor::Anchors;
use crate::view::{Element, View};

/// Replace the rendered birthdays, anniversaries and news with `model`'s.
///
/// All three containers are located before anything is touched; when one is
/// missing the view is left as it was and a render error is returned.
/// Rendering the same model twice leaves the same nodes behind.
pub fn render<V: View + ?Sized>(view: &mut V, model: &Model, today: NaiveDate) -> DashResult<()> {
    let anchors = Anchors::resolve(view).ok_or_else(|| {
        DashError::Render("dashboard containers not found in the view".to_string())
    })?;

    view.clear_children(anchors.birthdays);
    view.clear_children(anchors.anniversaries);
    view.clear_children(anchors.news);

    for person in &model.birthdays {
        view.append(anchors.birthdays, birthday_item(person, today).into());
    }
    for person in &model.anniversaries {
        view.append(anchors.anniversaries, anniversary_item(person, today).into());
    }
    for news in &model.news {
        view.prepend(anchors.news, news_item(news).into());
    }

    Ok(())
}

/// Up to two uppercase initials.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

fn ephemeral_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Shared layout of birthday and anniversary entries. `line` is the text
/// under the name.
fn person_item(
    prefix: &str,
    icon: &str,
    name: &str,
    date: &str,
    line: String,
    today: NaiveDate,
) -> Element {
    let celebrating = is_today(date, today);

    let name_el = Element::new("div")
        .class(NAME_CLASS)
        .child(name)
        .child_if(celebrating, || {
            Element::new("span")
                .class(BADGE_CLASS)
                .child(Element::icon(icon))
                .child(format!(" {} ", TODAY_MARKER))
                .child(Element::icon("fa-calendar-day"))
                .child(format!(" {}", date))
                .into()
        });

    Element::new("li")
        .class(ANNIVERSARY_ITEM_CLASS)
        .class_if(celebrating, "today")
        .attr("data-id", ephemeral_id(prefix))
        .child(
            Element::new("div")
                .class("anniversary-avatar")
                .child(Element::new("span").class("avatar-text").child(initials(name))),
        )
        .child(
            Element::new("div")
                .class("anniversary-info")
                .child(name_el)
                .child(Element::new("div").class(DATE_LINE_CLASS).child(line)),
        )
}

fn birthday_item(person: &PersonalBirthday, today: NaiveDate) -> Element {
    let line = format!(
        "{} {} {}",
        date_phrase(&person.date),
        LABEL_SEPARATOR,
        person.department
    );
    person_item("bday", "fa-birthday-cake", &person.name, &person.date, line, today)
}

fn anniversary_item(person: &CompanyAnniversary, today: NaiveDate) -> Element {
    let years = person.years_of_service;
    let line = format!(
        "{} {} {} {}",
        years,
        if years == 1 { "ano" } else { "anos" },
        LABEL_SEPARATOR,
        date_phrase(&person.date)
    );
    person_item("anniv", "fa-trophy", &person.name, &person.date, line, today)
}

fn news_item(news: &NewsItem) -> Element {
    let high = news.priority == Priority::High;

    let meta = Element::new("div")
        .class("news-meta")
        .child(
            Element::new("span")
                .class(NEWS_DATE_CLASS)
                .child(Element::icon("fa-calendar"))
                .child(format!(" {}", news.date)),
        )
        .child(
            Element::new("span")
                .class(NEWS_AUTHOR_CLASS)
                .child(Element::icon("fa-user"))
                .child(format!(" {}", news.author)),
        )
        .child_if(high, || {
            Element::new("span")
                .class("news-priority")
                .child(Element::icon("fa-exclamation-circle"))
                .child(" Prioridade Alta")
                .into()
        });

    Element::new("div")
        .class(NEWS_ITEM_CLASS)
        .class_if(high, HIGH_PRIORITY_CLASS)
        .attr("data-id", ephemeral_id("news"))
        .child(
            Element::new("div")
                .class("news-content")
                .child(Element::new("h3").class(NEWS_TITLE_CLASS).child(news.title.as_str()))
                .child(Element::new("p").class(NEWS_EXCERPT_CLASS).child(news.body.as_str()))
                .child(meta),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{collect, collect_birthdays};
    use crate::model::Event;
    use crate::store::EventsRead;
    use crate::view::anchor;
    use crate::view::ViewTree;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn sample() -> Model {
        Model {
            birthdays: vec![
                PersonalBirthday {
                    name: "Ana Silva".into(),
                    department: "TI".into(),
                    date: "05/03".into(),
                },
                PersonalBirthday {
                    name: "Bruno Costa".into(),
                    department: "Financeiro".into(),
                    date: "16/10".into(),
                },
            ],
            anniversaries: vec![
                CompanyAnniversary {
                    name: "Carlos Souza".into(),
                    years_of_service: 5,
                    date: "12/07".into(),
                },
                CompanyAnniversary {
                    name: "Mariana Lima".into(),
                    years_of_service: 1,
                    date: "16/10".into(),
                },
            ],
            news: vec![
                NewsItem {
                    title: "Primeira".into(),
                    body: "Texto".into(),
                    author: "RH".into(),
                    date: "01/09/2024".into(),
                    priority: Priority::Normal,
                },
                NewsItem {
                    title: "Segunda".into(),
                    body: "Urgente".into(),
                    author: "TI".into(),
                    date: "02/09/2024".into(),
                    priority: Priority::High,
                },
            ],
            events: vec![Event {
                name: "Kickoff".into(),
                ..Event::default()
            }],
            last_updated: Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("ana maria silva"), "AM");
        assert_eq!(initials("Carlos"), "C");
        assert_eq!(initials("  "), "");
    }

    #[test]
    fn test_collect_after_render_roundtrips() {
        let model = sample();
        let mut view = ViewTree::dashboard();
        render(&mut view, &model, today()).unwrap();

        let collected = collect(&view, EventsRead::Absent, &model);
        assert_eq!(collected, model);
    }

    #[test]
    fn test_render_twice_leaves_same_nodes() {
        let model = sample();
        let mut view = ViewTree::dashboard();

        render(&mut view, &model, today()).unwrap();
        let once = view.node_count();
        render(&mut view, &model, today()).unwrap();

        assert_eq!(view.node_count(), once);
        assert_eq!(view.query_class(view.root(), "anniversary-item").len(), 4);
        assert_eq!(view.query_class(view.root(), "news-item").len(), 2);
        assert_eq!(collect(&view, EventsRead::Absent, &model), model);
    }

    #[test]
    fn test_today_badge_never_reaches_the_model() {
        let mut model = Model::empty();
        model.birthdays.push(PersonalBirthday {
            name: "Bruno Costa".into(),
            department: "Financeiro".into(),
            date: "16/10".into(),
        });
        let mut view = ViewTree::dashboard();
        render(&mut view, &model, today()).unwrap();

        let column = anchor::list_in_column(&view, 0).unwrap();
        let badge = view.first_with_class(column, "anniversary-badge").unwrap();
        assert!(view.text_content(badge).contains("Hoje!"));

        let birthdays = collect_birthdays(&view);
        assert_eq!(birthdays[0].name, "Bruno Costa");
        assert_eq!(birthdays[0].date, "16/10");
    }

    #[test]
    fn test_newest_news_shown_first() {
        let mut view = ViewTree::dashboard();
        render(&mut view, &sample(), today()).unwrap();

        let items = view.query_class(view.root(), "news-item");
        assert_eq!(view.text_of(items[0], "news-title"), "Segunda");
        assert!(view.has_class(items[0], "high-priority"));
        assert!(view.first_with_class(items[0], "news-priority").is_some());
        assert!(view.first_with_class(items[1], "news-priority").is_none());
    }

    #[test]
    fn test_missing_anchor_leaves_view_untouched() {
        let mut view = ViewTree::new();
        view.append(view.root(), Element::new("div").class("news-container").into());
        let before = view.node_count();

        assert!(matches!(
            render(&mut view, &sample(), today()),
            Err(DashError::Render(_))
        ));
        assert_eq!(view.node_count(), before);
    }
}
