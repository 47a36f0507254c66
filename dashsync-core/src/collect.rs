//! Reading the model back out of the rendered dashboard.
//!
//! Each entry is parsed from the text the renderer wrote, so this module and
//! [`render`](crate::render) agree on one textual layout per collection.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{ANNIVERSARY_ITEM_CLASS, LABEL_SEPARATOR, NEWS_ITEM_CLASS};
use crate::dates::month_number;
use crate::model::{CompanyAnniversary, Model, NewsItem, PersonalBirthday, Priority};
use crate::normalize::clean;
use crate::store::EventsRead;
use crate::view::anchor;
use crate::view::{NodeId, View};

pub(crate) const NAME_CLASS: &str = "anniversary-name";
pub(crate) const DATE_LINE_CLASS: &str = "anniversary-date";
pub(crate) const BADGE_CLASS: &str = "anniversary-badge";
pub(crate) const NEWS_TITLE_CLASS: &str = "news-title";
pub(crate) const NEWS_EXCERPT_CLASS: &str = "news-excerpt";
pub(crate) const NEWS_AUTHOR_CLASS: &str = "news-author";
pub(crate) const NEWS_DATE_CLASS: &str = "news-date";
pub(crate) const HIGH_PRIORITY_CLASS: &str = "high-priority";

static DATE_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}) de ([^\s•]+)").expect("valid date phrase pattern"));

static BADGE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2})/(\d{2})").expect("valid badge date pattern"));

static YEARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) anos?").expect("valid years pattern"));

/// Rebuild the model from the view.
///
/// Birthdays and anniversaries come from the two dashboard columns, news from
/// every news item in the page. Events are not shown in those containers:
/// they come from the side channel when it holds a list, stay as they were
/// in `previous` when it is absent, and are empty when it is unreadable.
/// `last_updated` is carried over from `previous`; stamping is the caller's
/// job.
pub fn collect<V: View + ?Sized>(view: &V, events: EventsRead, previous: &Model) -> Model {
    Model {
        birthdays: collect_birthdays(view),
        anniversaries: collect_anniversaries(view),
        news: collect_news(view),
        events: match events {
            EventsRead::Found(events) => events,
            EventsRead::Absent => previous.events.clone(),
            EventsRead::Malformed => Vec::new(),
        },
        last_updated: previous.last_updated,
    }
}

fn column_items<V: View + ?Sized>(view: &V, index: usize) -> Vec<NodeId> {
    anchor::column(view, index)
        .map(|col| view.query_class(col, ANNIVERSARY_ITEM_CLASS))
        .unwrap_or_default()
}

pub fn collect_birthdays<V: View + ?Sized>(view: &V) -> Vec<PersonalBirthday> {
    column_items(view, 0)
        .into_iter()
        .map(|item| {
            let line = view.text_of(item, DATE_LINE_CLASS);
            PersonalBirthday {
                name: clean(&view.text_of(item, NAME_CLASS)),
                department: second_label(&line),
                date: day_month_of(view, item, &line),
            }
        })
        .collect()
}

pub fn collect_anniversaries<V: View + ?Sized>(view: &V) -> Vec<CompanyAnniversary> {
    column_items(view, 1)
        .into_iter()
        .map(|item| {
            let line = view.text_of(item, DATE_LINE_CLASS);
            let years_of_service = YEARS
                .captures(&line)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(0);
            CompanyAnniversary {
                name: clean(&view.text_of(item, NAME_CLASS)),
                years_of_service,
                date: day_month_of(view, item, &line),
            }
        })
        .collect()
}

/// News in model order. The page shows the newest first, so document order
/// is reversed.
pub fn collect_news<V: View + ?Sized>(view: &V) -> Vec<NewsItem> {
    let mut news: Vec<NewsItem> = view
        .query_class(view.root(), NEWS_ITEM_CLASS)
        .into_iter()
        .map(|item| NewsItem {
            title: clean(&view.text_of(item, NEWS_TITLE_CLASS)),
            body: view.text_of(item, NEWS_EXCERPT_CLASS).trim().to_string(),
            author: view.text_of(item, NEWS_AUTHOR_CLASS).trim().to_string(),
            date: view.text_of(item, NEWS_DATE_CLASS).trim().to_string(),
            priority: if view.has_class(item, HIGH_PRIORITY_CLASS) {
                Priority::High
            } else {
                Priority::Normal
            },
        })
        .collect();
    news.reverse();
    news
}

/// Everything after the first label separator, trimmed.
fn second_label(line: &str) -> String {
    line.splitn(2, LABEL_SEPARATOR)
        .nth(1)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// `DD/MM` from the "5 de março" phrase, falling back to the date printed in
/// the today badge.
fn day_month_of<V: View + ?Sized>(view: &V, item: NodeId, line: &str) -> String {
    if let Some(caps) = DATE_PHRASE.captures(line) {
        if let Some(month) = month_number(&caps[2]) {
            return format!("{:0>2}/{:02}", &caps[1], month);
        }
    }
    let badge = view.text_of(item, BADGE_CLASS);
    BADGE_DATE
        .captures(&badge)
        .map(|caps| format!("{}/{}", &caps[1], &caps[2]))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Event;
    use crate::view::{Element, ViewTree};

    fn item(name: &str, line: &str) -> Element {
        Element::new("li")
            .class("anniversary-item")
            .child(
                Element::new("div")
                    .class("anniversary-info")
                    .child(Element::new("div").class("anniversary-name").child(name))
                    .child(Element::new("div").class("anniversary-date").child(line)),
            )
    }

    fn list(view: &ViewTree, index: usize) -> NodeId {
        anchor::list_in_column(view, index).unwrap()
    }

    #[test]
    fn test_collect_birthday_from_phrase() {
        let mut view = ViewTree::dashboard();
        let ul = list(&view, 0);
        view.append(ul, item("Ana Silva", "5 de março • TI").into());

        let birthdays = collect_birthdays(&view);
        assert_eq!(
            birthdays,
            vec![PersonalBirthday {
                name: "Ana Silva".into(),
                department: "TI".into(),
                date: "05/03".into(),
            }]
        );
    }

    #[test]
    fn test_department_keeps_inner_separator() {
        let mut view = ViewTree::dashboard();
        let ul = list(&view, 0);
        view.append(ul, item("Rita Alves", "9 de maio • P&D • Labs").into());

        let birthdays = collect_birthdays(&view);
        assert_eq!(birthdays[0].department, "P&D • Labs");
        assert_eq!(birthdays[0].date, "09/05");
    }

    #[test]
    fn test_collect_falls_back_to_badge_date() {
        let mut view = ViewTree::dashboard();
        let ul = list(&view, 0);
        let entry = Element::new("li").class("anniversary-item").child(
            Element::new("div")
                .class("anniversary-name")
                .child("Bruno")
                .child(
                    Element::new("span")
                        .class("anniversary-badge")
                        .child(" Hoje! ")
                        .child(" 16/10"),
                ),
        );
        view.append(ul, entry.into());

        let birthdays = collect_birthdays(&view);
        assert_eq!(birthdays[0].name, "Bruno");
        assert_eq!(birthdays[0].date, "16/10");
        assert_eq!(birthdays[0].department, "");
    }

    #[test]
    fn test_collect_anniversary_years() {
        let mut view = ViewTree::dashboard();
        let ul = list(&view, 1);
        view.append(ul, item("Carlos Souza", "5 anos • 12 de julho").into());
        view.append(ul, item("Mariana Lima", "1 ano • 3 de fevereiro").into());
        view.append(ul, item("Sem data", "").into());

        let anniversaries = collect_anniversaries(&view);
        assert_eq!(anniversaries[0].years_of_service, 5);
        assert_eq!(anniversaries[0].date, "12/07");
        assert_eq!(anniversaries[1].years_of_service, 1);
        assert_eq!(anniversaries[1].date, "03/02");
        assert_eq!(anniversaries[2].years_of_service, 0);
        assert_eq!(anniversaries[2].date, "");
    }

    #[test]
    fn test_collect_news_reverses_document_order() {
        let mut view = ViewTree::dashboard();
        let container = anchor::news_container(&view).unwrap();
        for (title, high) in [("Mais nova", true), ("Mais antiga", false)] {
            let news = Element::new("div")
                .class(if high { "news-item high-priority" } else { "news-item" })
                .child(Element::new("h3").class("news-title").child(title))
                .child(Element::new("p").class("news-excerpt").child(" corpo "))
                .child(
                    Element::new("span")
                        .class("news-author")
                        .child(Element::icon("fa-user"))
                        .child(" RH"),
                );
            view.append(container, news.into());
        }

        let news = collect_news(&view);
        assert_eq!(news[0].title, "Mais antiga");
        assert_eq!(news[0].priority, Priority::Normal);
        assert_eq!(news[1].title, "Mais nova");
        assert_eq!(news[1].priority, Priority::High);
        assert_eq!(news[1].body, "corpo");
        assert_eq!(news[1].author, "RH");
    }

    #[test]
    fn test_events_follow_side_channel() {
        let view = ViewTree::dashboard();
        let mut previous = Model::empty();
        previous.events.push(Event {
            name: "Kickoff".into(),
            ..Event::default()
        });

        let kept = collect(&view, EventsRead::Absent, &previous);
        assert_eq!(kept.events, previous.events);
        assert_eq!(kept.last_updated, previous.last_updated);

        let replaced = collect(&view, EventsRead::Found(Vec::new()), &previous);
        assert!(replaced.events.is_empty());

        let dropped = collect(&view, EventsRead::Malformed, &previous);
        assert!(dropped.events.is_empty());
    }

    #[test]
    fn test_collect_without_columns_is_empty() {
        let view = ViewTree::new();
        let model = collect(&view, EventsRead::Absent, &Model::empty());
        assert!(model.is_empty());
    }
}
