//! Display-text rewriting for mirror records.

use crate::config::Settings;

/// Name and description rewriting driven by [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTransform {
    prefix: String,
    suffix: String,
    find: String,
    replace: String,
}

impl TextTransform {
    /// Builds the transform from settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            prefix: settings.spell_prefix.clone(),
            suffix: settings.spell_suffix.clone(),
            find: settings.words_to_replace_in_description.clone(),
            replace: settings.replacement_words_for_description.clone(),
        }
    }

    /// Sets `target` to `prefix + source + suffix`, or clears it when the
    /// source has no name.
    pub fn edit_name(&self, source: Option<&str>, target: &mut Option<String>) {
        *target = source.map(|name| format!("{}{name}{}", self.prefix, self.suffix));
    }

    /// Sets `target` to `source` with every literal occurrence of the
    /// configured phrase replaced, or clears it when the source has no
    /// description.
    ///
    /// An empty search phrase matches nothing: the description is copied
    /// through unchanged.
    pub fn edit_description(&self, source: Option<&str>, target: &mut Option<String>) {
        *target = source.map(|description| {
            if self.find.is_empty() {
                description.to_string()
            } else {
                description.replace(&self.find, &self.replace)
            }
        });
    }
}

impl Default for TextTransform {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}
