//! Runtime context used to gate rules at load time: the utterance
//! locale, the recognizer service, and the app being edited.

use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorContext {
    locale: Option<String>,
    service: Option<String>,
    app: Option<String>,
}

impl EditorContext {
    pub fn new(
        locale: Option<String>,
        service: Option<String>,
        app: Option<String>,
    ) -> Self {
        EditorContext {
            locale,
            service,
            app,
        }
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    /// A rule without a filter always passes; a filter requires a
    /// present, fully matching context value.
    pub(crate) fn admits(
        &self,
        locale: Option<&Regex>,
        service: Option<&Regex>,
        app: Option<&Regex>,
    ) -> bool {
        admits_one(locale, self.locale.as_deref())
            && admits_one(service, self.service.as_deref())
            && admits_one(app, self.app.as_deref())
    }
}

fn admits_one(filter: Option<&Regex>, value: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(re) => match value {
            Some(v) => re.is_match(v),
            None => false,
        },
    }
}
