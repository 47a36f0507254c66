//! The admin panel: one editable list per collection, plus the forms used to
//! add entries.
//!
//! Entries carry their fields as `data-*` attributes and a removal checkbox.
//! Reading the panel back keeps the unchecked entries and appends whatever the
//! forms hold.

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;

use crate::dates::{format_event_time, format_timestamp, input_to_day_month, news_date};
use crate::model::{CompanyAnniversary, Event, Model, NewsItem, PersonalBirthday, Priority};
use crate::normalize::clean_day_month;
use crate::view::{Element, NodeId, View};

pub const ADMIN_ITEM_CLASS: &str = "admin-list-item";
pub const REMOVE_CHECKBOX_CLASS: &str = "admin-remove";
pub const LAST_UPDATED_ID: &str = "ultimaAtualizacao";

const BDAY_LIST_ID: &str = "adminBdayList";
const ANNIV_LIST_ID: &str = "adminAnnivList";
const NEWS_LIST_ID: &str = "adminNewsList";
const EVENT_LIST_ID: &str = "adminEventList";

/// Refresh every admin list present in the view and the last-updated label.
/// Lists without an anchor are skipped.
pub fn render_admin<V: View + ?Sized>(view: &mut V, model: &Model) {
    fill_list(view, BDAY_LIST_ID, model.birthdays.iter().map(|p| {
        admin_item(
            &[
                ("data-nome", p.name.as_str()),
                ("data-depto", p.department.as_str()),
                ("data-data", p.date.as_str()),
            ],
            format!("{} ({}) - {}", p.name, p.department, p.date),
        )
    }));

    fill_list(view, ANNIV_LIST_ID, model.anniversaries.iter().map(|p| {
        let years = p.years_of_service.to_string();
        admin_item(
            &[
                ("data-nome", p.name.as_str()),
                ("data-anos", years.as_str()),
                ("data-data", p.date.as_str()),
            ],
            format!("{} - {} ano(s) - {}", p.name, years, p.date),
        )
    }));

    fill_list(view, NEWS_LIST_ID, model.news.iter().map(|n| {
        admin_item(
            &[
                ("data-titulo", n.title.as_str()),
                ("data-conteudo", n.body.as_str()),
                ("data-autor", n.author.as_str()),
                ("data-data", n.date.as_str()),
                ("data-prioridade", n.priority.as_str()),
            ],
            format!("{} - {}", n.title, n.author),
        )
    }));

    fill_list(view, EVENT_LIST_ID, model.events.iter().map(|e| {
        admin_item(
            &[
                ("data-nome", e.name.as_str()),
                ("data-descricao", e.description.as_str()),
                ("data-local", e.location.as_str()),
                ("data-data", e.timestamp.as_str()),
            ],
            format!(
                "{} - {} - {}",
                e.name,
                format_event_time(&e.timestamp),
                e.location
            ),
        )
    }));

    render_last_updated(view, model.last_updated);
}

/// Write the formatted timestamp into the last-updated label, if present.
pub fn render_last_updated<V: View + ?Sized>(view: &mut V, at: DateTime<Utc>) {
    if let Some(label) = view.element_by_id(LAST_UPDATED_ID) {
        view.set_text(label, &format_timestamp(at));
    }
}

fn fill_list<V, I>(view: &mut V, list_id: &str, items: I)
where
    V: View + ?Sized,
    I: Iterator<Item = Element>,
{
    let Some(list) = view.element_by_id(list_id) else {
        debug!("Admin list '{}' not present, skipping", list_id);
        return;
    };
    view.clear_children(list);
    for item in items {
        view.append(list, item.into());
    }
}

fn admin_item(fields: &[(&str, &str)], summary: String) -> Element {
    let mut item = Element::new("div").class(ADMIN_ITEM_CLASS);
    for (name, value) in fields {
        item = item.attr(name, *value);
    }
    item.child(
        Element::new("input")
            .class(REMOVE_CHECKBOX_CLASS)
            .attr("type", "checkbox"),
    )
    .child(Element::new("span").child(summary))
}

/// Rebuild the model from the admin panel.
///
/// Collections whose list is missing from the view keep `model`'s entries.
/// A form whose required fields are filled adds one entry and is cleared;
/// an incomplete form is left as typed.
/// `last_updated` is carried over unchanged.
pub fn collect_admin<V: View + ?Sized>(view: &mut V, model: &Model, today: NaiveDate) -> Model {
    let mut birthdays = kept_items(&*view, BDAY_LIST_ID)
        .map(|items| {
            items
                .into_iter()
                .map(|item| PersonalBirthday {
                    name: data(&*view, item, "data-nome"),
                    department: data(&*view, item, "data-depto"),
                    date: data(&*view, item, "data-data"),
                })
                .collect()
        })
        .unwrap_or_else(|| model.birthdays.clone());

    let mut anniversaries = kept_items(&*view, ANNIV_LIST_ID)
        .map(|items| {
            items
                .into_iter()
                .map(|item| CompanyAnniversary {
                    name: data(&*view, item, "data-nome"),
                    years_of_service: data(&*view, item, "data-anos").trim().parse().unwrap_or(0),
                    date: data(&*view, item, "data-data"),
                })
                .collect()
        })
        .unwrap_or_else(|| model.anniversaries.clone());

    let mut news = kept_items(&*view, NEWS_LIST_ID)
        .map(|items| {
            items
                .into_iter()
                .map(|item| NewsItem {
                    title: data(&*view, item, "data-titulo"),
                    body: data(&*view, item, "data-conteudo"),
                    author: data(&*view, item, "data-autor"),
                    date: data(&*view, item, "data-data"),
                    priority: Priority::from_label(&data(&*view, item, "data-prioridade")),
                })
                .collect()
        })
        .unwrap_or_else(|| model.news.clone());

    let mut events = kept_items(&*view, EVENT_LIST_ID)
        .map(|items| {
            items
                .into_iter()
                .map(|item| Event {
                    name: data(&*view, item, "data-nome"),
                    description: data(&*view, item, "data-descricao"),
                    location: data(&*view, item, "data-local"),
                    timestamp: data(&*view, item, "data-data"),
                })
                .collect()
        })
        .unwrap_or_else(|| model.events.clone());

    const BIRTHDAY_FORM: [&str; 3] = ["adminBdayName", "adminBdayDept", "adminBdayDate"];
    let [name, department, date] = BIRTHDAY_FORM.map(|id| input_value(&*view, id));
    let date = form_day_month(&date);
    if !name.is_empty() && !date.is_empty() {
        birthdays.push(PersonalBirthday {
            name,
            department,
            date,
        });
        clear_inputs(view, &BIRTHDAY_FORM);
    }

    const ANNIVERSARY_FORM: [&str; 3] = ["adminAnnivName", "adminAnnivYears", "adminAnnivDate"];
    let [name, years, date] = ANNIVERSARY_FORM.map(|id| input_value(&*view, id));
    let date = form_day_month(&date);
    if !name.is_empty() && !date.is_empty() {
        anniversaries.push(CompanyAnniversary {
            name,
            years_of_service: years.parse().unwrap_or(1),
            date,
        });
        clear_inputs(view, &ANNIVERSARY_FORM);
    }

    const NEWS_FORM: [&str; 4] = [
        "adminNewsTitle",
        "adminNewsContent",
        "adminNewsAuthor",
        "adminNewsPriority",
    ];
    let [title, body, author, priority] = NEWS_FORM.map(|id| input_value(&*view, id));
    if !title.is_empty() && !body.is_empty() {
        news.push(NewsItem {
            title,
            body,
            author,
            date: news_date(today),
            priority: Priority::from_label(&priority),
        });
        clear_inputs(view, &NEWS_FORM);
    }

    const EVENT_FORM: [&str; 4] = [
        "adminEventName",
        "adminEventDateTime",
        "adminEventDescription",
        "adminEventLocation",
    ];
    let [name, timestamp, description, location] = EVENT_FORM.map(|id| input_value(&*view, id));
    if !name.is_empty() && !timestamp.is_empty() {
        events.push(Event {
            name,
            description,
            location,
            timestamp,
        });
        clear_inputs(view, &EVENT_FORM);
    }

    Model {
        birthdays,
        anniversaries,
        news,
        events,
        last_updated: model.last_updated,
    }
}

/// Entries of the list whose removal box is not ticked, or `None` when the
/// list is not in the view.
fn kept_items<V: View + ?Sized>(view: &V, list_id: &str) -> Option<Vec<NodeId>> {
    let list = view.element_by_id(list_id)?;
    Some(
        view.query_class(list, ADMIN_ITEM_CLASS)
            .into_iter()
            .filter(|item| !marked_for_removal(view, *item))
            .collect(),
    )
}

fn marked_for_removal<V: View + ?Sized>(view: &V, item: NodeId) -> bool {
    view.first_with_class(item, REMOVE_CHECKBOX_CLASS)
        .and_then(|checkbox| view.attribute(checkbox, "checked"))
        .is_some_and(|checked| checked != "false")
}

fn data<V: View + ?Sized>(view: &V, item: NodeId, name: &str) -> String {
    view.attribute(item, name).unwrap_or_default()
}

/// Trimmed value of a form input.
fn input_value<V: View + ?Sized>(view: &V, id: &str) -> String {
    view.element_by_id(id)
        .and_then(|input| view.attribute(input, "value"))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn clear_inputs<V: View + ?Sized>(view: &mut V, ids: &[&str]) {
    for id in ids {
        if let Some(input) = view.element_by_id(id) {
            view.set_attribute(input, "value", "");
        }
    }
}

/// Date inputs hold `YYYY-MM-DD`; anything else is reduced like stored data.
fn form_day_month(input: &str) -> String {
    input_to_day_month(input).unwrap_or_else(|| clean_day_month(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewTree;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn sample() -> Model {
        let mut model = Model::empty();
        model.birthdays = vec![
            PersonalBirthday {
                name: "Ana Silva".into(),
                department: "TI".into(),
                date: "05/03".into(),
            },
            PersonalBirthday {
                name: "Bruno Costa".into(),
                department: "RH".into(),
                date: "18/06".into(),
            },
        ];
        model.anniversaries = vec![CompanyAnniversary {
            name: "Carlos Souza".into(),
            years_of_service: 5,
            date: "12/07".into(),
        }];
        model.news = vec![NewsItem {
            title: "Aviso".into(),
            body: "Texto".into(),
            author: "RH".into(),
            date: "01/09/2024".into(),
            priority: Priority::High,
        }];
        model.last_updated = Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap();
        model
    }

    #[test]
    fn test_admin_roundtrip_without_changes() {
        let model = sample();
        let mut view = ViewTree::dashboard();
        render_admin(&mut view, &model);

        assert_eq!(collect_admin(&mut view, &model, today()), model);
    }

    #[test]
    fn test_checked_entries_are_removed() {
        let model = sample();
        let mut view = ViewTree::dashboard();
        render_admin(&mut view, &model);

        let list = view.element_by_id("adminBdayList").unwrap();
        let first = view.query_class(list, ADMIN_ITEM_CLASS)[0];
        let checkbox = view.first_with_class(first, REMOVE_CHECKBOX_CLASS).unwrap();
        view.set_attribute(checkbox, "checked", "checked");

        let collected = collect_admin(&mut view, &model, today());
        assert_eq!(collected.birthdays.len(), 1);
        assert_eq!(collected.birthdays[0].name, "Bruno Costa");
    }

    #[test]
    fn test_forms_add_entries_and_are_cleared() {
        let model = Model::empty();
        let mut view = ViewTree::dashboard();
        render_admin(&mut view, &model);

        view.set_value("adminBdayName", "  Juliana Rocha ");
        view.set_value("adminBdayDept", "RH");
        view.set_value("adminBdayDate", "1990-11-27");
        view.set_value("adminAnnivName", "Pedro");
        view.set_value("adminAnnivDate", "2020-02-03");
        view.set_value("adminNewsTitle", "Novidade");
        view.set_value("adminNewsContent", "Texto");
        view.set_value("adminNewsPriority", "alta");
        view.set_value("adminEventName", "Workshop");
        view.set_value("adminEventDateTime", "2026-10-20T14:00");

        let collected = collect_admin(&mut view, &model, today());

        assert_eq!(collected.birthdays[0].name, "Juliana Rocha");
        assert_eq!(collected.birthdays[0].date, "27/11");
        assert_eq!(collected.anniversaries[0].years_of_service, 1);
        assert_eq!(collected.anniversaries[0].date, "03/02");
        assert_eq!(collected.news[0].date, "16/10/2026");
        assert_eq!(collected.news[0].priority, Priority::High);
        assert_eq!(collected.events[0].timestamp, "2026-10-20T14:00");
        assert_eq!(view.value("adminBdayName").as_deref(), Some(""));
        assert_eq!(view.value("adminEventName").as_deref(), Some(""));
    }

    #[test]
    fn test_incomplete_forms_add_nothing() {
        let model = Model::empty();
        let mut view = ViewTree::dashboard();
        render_admin(&mut view, &model);

        view.set_value("adminBdayName", "Juliana Rocha");
        view.set_value("adminBdayDept", "RH");
        view.set_value("adminAnnivName", "Pedro");
        view.set_value("adminAnnivYears", "3");
        view.set_value("adminNewsTitle", "Sem corpo");
        view.set_value("adminEventName", "Sem data");

        let collected = collect_admin(&mut view, &model, today());

        assert!(collected.birthdays.is_empty());
        assert!(collected.anniversaries.is_empty());
        assert!(collected.news.is_empty());
        assert!(collected.events.is_empty());
        assert_eq!(
            view.value("adminBdayName").as_deref(),
            Some("Juliana Rocha")
        );
        assert_eq!(view.value("adminNewsTitle").as_deref(), Some("Sem corpo"));
    }

    #[test]
    fn test_missing_lists_keep_model_entries() {
        let model = sample();
        let mut view = ViewTree::new();
        render_admin(&mut view, &model);

        assert_eq!(collect_admin(&mut view, &model, today()), model);
    }

    #[test]
    fn test_last_updated_label() {
        let mut view = ViewTree::dashboard();
        let at = Utc.with_ymd_and_hms(2024, 9, 1, 9, 30, 0).unwrap();
        render_last_updated(&mut view, at);

        let label = view.element_by_id(LAST_UPDATED_ID).unwrap();
        assert_eq!(view.text_content(label), format_timestamp(at));
        assert!(view.text_content(label).contains(" às "));
    }
}
