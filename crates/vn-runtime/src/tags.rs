use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub type TagProvider = Rc<dyn Fn() -> String>;

/// A named `<tag>` that renders host-provided text inside dialogue.
#[derive(Clone)]
pub struct DialogueTag {
    name: String,
    provider: Option<TagProvider>,
    fallback: String,
}

impl fmt::Debug for DialogueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueTag")
            .field("name", &self.name)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl DialogueTag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> String {
        match &self.provider {
            Some(provider) => provider(),
            None => self.fallback.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagBank {
    tags: BTreeMap<String, DialogueTag>,
}

impl TagBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, provider: TagProvider) -> &mut Self {
        self.tags.insert(
            name.to_ascii_lowercase(),
            DialogueTag {
                name: name.to_string(),
                provider: Some(provider),
                fallback: String::new(),
            },
        );
        self
    }

    pub fn register_static(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.tags.insert(
            name.to_ascii_lowercase(),
            DialogueTag {
                name: name.to_string(),
                provider: None,
                fallback: value.into(),
            },
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(&name.trim().to_ascii_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.tags
            .get(&name.trim().to_ascii_lowercase())
            .map(DialogueTag::value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.values().map(DialogueTag::name)
    }
}
