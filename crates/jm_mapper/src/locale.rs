use core::fmt;
use core::str::FromStr;

use jm_reflect::impls::NonGenericTypeInfoCell;
use jm_reflect::info::{OpaqueInfo, TypeInfo, Typed};

use crate::ConvertError;
use crate::adapter::Converter;

/// A language tag: language, optional country and optional variant.
///
/// Written as `en-US`; `en_US` is accepted on input.
///
/// ```
/// use jm_mapper::Locale;
///
/// let locale: Locale = "fr_CA".parse().unwrap();
/// assert_eq!(locale.language(), "fr");
/// assert_eq!(locale.country(), Some("CA"));
/// assert_eq!(locale.to_string(), "fr-CA");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    country: Option<String>,
    variant: Option<String>,
}

impl Locale {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            country: None,
            variant: None,
        }
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_ascii_uppercase());
        self
    }

    pub fn with_variant(mut self, variant: &str) -> Self {
        self.variant = Some(variant.to_owned());
        self
    }

    #[inline]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[inline]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    #[inline]
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        if let Some(country) = &self.country {
            write!(f, "-{country}")?;
        }
        if let Some(variant) = &self.variant {
            write!(f, "-{variant}")?;
        }
        Ok(())
    }
}

impl FromStr for Locale {
    type Err = ConvertError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = text.trim().split(['-', '_']);
        let language = parts.next().unwrap_or_default();
        if !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConvertError::new(format!("invalid language in {text:?}")));
        }
        let mut locale = Locale::new(language);
        if let Some(country) = parts.next().filter(|part| !part.is_empty()) {
            locale = locale.with_country(country);
        }
        let variant: Vec<&str> = parts.collect();
        if !variant.is_empty() {
            locale = locale.with_variant(&variant.join("-"));
        }
        Ok(locale)
    }
}

impl Typed for Locale {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Opaque(
                OpaqueInfo::new::<Locale>()
                    .with_display::<Locale>()
                    .with_default::<Locale>(),
            )
        })
    }
}

/// Text converter of [`Locale`].
pub(crate) struct LocaleConverter;

impl Converter<Locale> for LocaleConverter {
    fn write(&self, value: &Locale) -> String {
        value.to_string()
    }

    fn read(&self, text: &str) -> Result<Locale, ConvertError> {
        text.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::Locale;

    #[test]
    fn tags_parse_and_render() {
        let locale: Locale = "en-us-posix".parse().unwrap();
        assert_eq!(locale, Locale::new("en").with_country("US").with_variant("posix"));
        assert_eq!(locale.to_string(), "en-US-posix");

        let bare: Locale = "DE".parse().unwrap();
        assert_eq!(bare.to_string(), "de");
        assert!("e1".parse::<Locale>().is_err());
    }
}
