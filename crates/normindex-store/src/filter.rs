//! Citation lookup filter.

use crate::StoreError;

/// Filter for exact-citation lookup.
///
/// All fields are optional, but `sub_section` is only meaningful beneath a
/// `section`: supplying it alone is a validation error, not a silent
/// ignore, for every `code` value including none.
#[derive(Debug, Clone, Default)]
pub struct TextFilter {
    pub code: Option<String>,
    pub section: Option<String>,
    pub sub_section: Option<String>,
}

impl TextFilter {
    /// Filter matching every unit of one code.
    pub fn for_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        if self.sub_section.is_some() && self.section.is_none() {
            return Err(StoreError::SubSectionWithoutSection);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_only_is_valid() {
        assert!(TextFilter::for_code("bgb").validate().is_ok());
    }

    #[test]
    fn section_with_sub_section_is_valid() {
        let filter = TextFilter {
            code: Some("bgb".into()),
            section: Some("§ 1".into()),
            sub_section: Some("1".into()),
        };
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn sub_section_without_section_rejected() {
        let filter = TextFilter {
            code: Some("bgb".into()),
            section: None,
            sub_section: Some("1".into()),
        };
        assert!(matches!(
            filter.validate(),
            Err(StoreError::SubSectionWithoutSection)
        ));
    }

    #[test]
    fn sub_section_without_section_rejected_for_absent_code() {
        let filter = TextFilter {
            code: None,
            section: None,
            sub_section: Some("1".into()),
        };
        assert!(matches!(
            filter.validate(),
            Err(StoreError::SubSectionWithoutSection)
        ));
    }
}
