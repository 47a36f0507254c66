//! Detached element trees handed to [`View::append`](super::View::append).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Element(Element),
    Text(String),
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text(text.into())
    }
}

impl From<Element> for Fragment {
    fn from(element: Element) -> Self {
        Fragment::Element(element)
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment::Text(text.to_string())
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment::Text(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Fragment>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add one or more space-separated classes.
    pub fn class(mut self, class: &str) -> Self {
        self.classes
            .extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn class_if(self, cond: bool, class: &str) -> Self {
        if cond { self.class(class) } else { self }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Fragment>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn child_if(self, cond: bool, child: impl FnOnce() -> Fragment) -> Self {
        if cond { self.child(child()) } else { self }
    }

    /// Icon element (`<i class="fas fa-...">`), which carries no text.
    pub fn icon(name: &str) -> Self {
        Element::new("i").class(&format!("fas {}", name))
    }
}
