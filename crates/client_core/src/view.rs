//! Declarative view tree produced from the view model and consumed by front ends.

use shared::domain::CaseSection;

use crate::answers::AnswerKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Div,
    Heading(u8),
    Paragraph,
    Strong,
    Span,
    List,
    ListItem,
}

/// Icon glyphs, named after the icon set the markup references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    CheckCircle,
    XCircle,
    ChevronDown,
    RefreshCw,
}

impl Icon {
    pub fn name(self) -> &'static str {
        match self {
            Icon::CheckCircle => "check-circle",
            Icon::XCircle => "x-circle",
            Icon::ChevronDown => "chevron-down",
            Icon::RefreshCw => "refresh-cw",
        }
    }
}

/// What activating an interactive node asks the controller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NewCase,
    ToggleCard(CaseSection),
    AnswerCurrent,
    SelectOption { question: usize, option: usize },
    SubmitAnswers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub classes: Vec<String>,
    pub key: Option<String>,
    pub hidden: bool,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            classes: Vec::new(),
            key: None,
            hidden: false,
            children: Vec::new(),
        }
    }

    pub fn div(classes: &str) -> Self {
        Self::new(Tag::Div).class(classes)
    }

    /// Adds every whitespace-separated class in `classes`.
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    pub icon: Option<Icon>,
    pub action: Action,
    pub disabled: bool,
    pub busy: bool,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            icon: None,
            action,
            disabled: false,
            busy: false,
        }
    }

    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    pub binding: AnswerKey,
    pub value: String,
    pub placeholder: &'static str,
    pub multiline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadioOption {
    pub group: String,
    pub value: String,
    pub checked: bool,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Icon(Icon),
    Button(Button),
    TextInput(TextInput),
    Radio(RadioOption),
    /// Placeholder shown while a case is being fetched.
    Skeleton,
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl From<Button> for Node {
    fn from(value: Button) -> Self {
        Node::Button(value)
    }
}

impl From<TextInput> for Node {
    fn from(value: TextInput) -> Self {
        Node::TextInput(value)
    }
}

impl From<RadioOption> for Node {
    fn from(value: RadioOption) -> Self {
        Node::Radio(value)
    }
}

impl From<Icon> for Node {
    fn from(value: Icon) -> Self {
        Node::Icon(value)
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.as_element().is_some_and(|e| e.has_class(class))
    }

    fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            _ => &[],
        }
    }

    /// Depth-first, pre-order walk over this node and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub fn find_all<'a>(&'a self, mut pred: impl FnMut(&Node) -> bool) -> Vec<&'a Node> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if pred(node) {
                out.push(node);
            }
        });
        out
    }

    pub fn find_by_class(&self, class: &str) -> Vec<&Node> {
        self.find_all(|node| node.has_class(class))
    }

    pub fn find_by_key(&self, key: &str) -> Option<&Node> {
        self.find_all(|node| {
            node.as_element()
                .and_then(|e| e.key.as_deref())
                .is_some_and(|k| k == key)
        })
        .into_iter()
        .next()
    }

    pub fn buttons(&self) -> Vec<&Button> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let Node::Button(button) = node {
                out.push(button);
            }
        });
        out
    }

    /// Icons in document order, including those drawn on buttons.
    pub fn icons(&self) -> Vec<Icon> {
        let mut out = Vec::new();
        self.walk(&mut |node| match node {
            Node::Icon(icon) => out.push(*icon),
            Node::Button(Button {
                icon: Some(icon), ..
            }) => out.push(*icon),
            _ => {}
        });
        out
    }

    /// Concatenated visible text, with button labels included. Hidden
    /// subtrees are skipped.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Element(element) if element.hidden => {}
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Text(text) => out.push_str(text),
            Node::Button(button) => out.push_str(&button.label),
            Node::TextInput(input) => out.push_str(&input.value),
            Node::Radio(radio) => out.push_str(&radio.value),
            Node::Icon(_) | Node::Skeleton => {}
        }
    }
}
