//! Fixed names shared by the view and storage layers.

/// Key the canonical model is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "excel_dashboard_data";

/// Side-channel key holding the event list.
pub const DEFAULT_EVENTS_KEY: &str = "excelEventos";

/// Suggested filename for exports (and the bundled default file).
pub const DEFAULT_EXPORT_FILENAME: &str = "dashboard_data.json";

/// Element classes whose mutations mean "an entity list changed".
pub const ANNIVERSARY_ITEM_CLASS: &str = "anniversary-item";
pub const NEWS_ITEM_CLASS: &str = "news-item";
pub const EVENT_ITEM_CLASS: &str = "event-item";

/// Buttons whose handlers edit the admin panel; clicking one re-collects it.
pub const KNOWN_ACTION_BUTTONS: [&str; 8] = [
    "saveBdayBtn",
    "saveAnnivBtn",
    "saveNewsBtn",
    "saveEventBtn",
    "clearBdayBtn",
    "clearAnnivBtn",
    "clearNewsBtn",
    "clearEventBtn",
];

/// Suffix identifying generic action buttons.
pub const ACTION_BUTTON_SUFFIX: &str = "Btn";

/// Marker text of the "today" badge.
pub const TODAY_MARKER: &str = "Hoje!";

/// Month names used both for rendering and for parsing date phrases.
pub const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Separator between the two labels of a compound date line.
pub const LABEL_SEPARATOR: char = '•';
