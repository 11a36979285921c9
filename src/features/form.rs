//! Memoized form body capability.
use crate::{
    form::{FormCollection, MULTIPART, URLENCODED, media_type},
    values::ValueMap,
};

/// The parsed form body, memoized for the rest of the request.
///
/// Once populated, every later read observes the same collection until the
/// setter overwrites it.
#[derive(Debug, Default)]
pub struct FormFeature {
    form: Option<FormCollection>,
}

impl FormFeature {
    /// Create [`FormFeature`] with no form read yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create [`FormFeature`] pre-populated with a collection.
    pub fn with(form: FormCollection) -> Self {
        Self { form: Some(form) }
    }

    /// Returns the memoized collection, if the form has been read.
    #[inline]
    pub fn form(&self) -> Option<&FormCollection> {
        self.form.as_ref()
    }

    /// Overwrite the memoized collection.
    pub fn set(&mut self, form: FormCollection) {
        self.form = Some(form);
    }

    pub(crate) fn form_slot(&mut self) -> &mut Option<FormCollection> {
        &mut self.form
    }
}

/// Returns `true` if the `Content-Type` media type, ignoring parameters, is
/// a supported form media type.
pub fn has_form_content_type(headers: &ValueMap) -> bool {
    match headers.first("content-type") {
        Some(content_type) => {
            let media = media_type(content_type);
            media.eq_ignore_ascii_case(URLENCODED) || media.eq_ignore_ascii_case(MULTIPART)
        }
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recognizes_form_media_types() {
        let mut headers = ValueMap::new();
        assert!(!has_form_content_type(&headers));

        headers.insert("content-type", "application/x-www-form-urlencoded");
        assert!(has_form_content_type(&headers));

        headers.insert("content-type", "Multipart/Form-Data; boundary=x");
        assert!(has_form_content_type(&headers));

        headers.insert("content-type", "application/json");
        assert!(!has_form_content_type(&headers));
    }
}
