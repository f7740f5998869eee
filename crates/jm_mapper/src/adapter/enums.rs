use jm_reflect::Reflect;
use jm_reflect::info::{EnumInfo, TypeInfo};
use jm_utils::hash::HashMap;

use crate::MapperError;
use crate::adapter::Adapter;
use crate::error::ConvertError;

/// Name-based adapter derived from an [`EnumInfo`].
///
/// Variants are written by their serialized name. The name lookup table is
/// built once, when the adapter is created.
pub struct EnumAdapter {
    info: &'static TypeInfo,
    enum_info: &'static EnumInfo,
    by_name: HashMap<&'static str, usize>,
}

impl EnumAdapter {
    /// Returns `None` when `info` does not describe an enum.
    pub fn new(info: &'static TypeInfo) -> Option<Self> {
        let enum_info = info.as_enum().ok()?;
        let by_name = enum_info
            .variants()
            .iter()
            .enumerate()
            .map(|(index, variant)| (variant.serialized_name(), index))
            .collect();
        Some(Self {
            info,
            enum_info,
            by_name,
        })
    }
}

impl Adapter for EnumAdapter {
    #[inline]
    fn type_info(&self) -> &'static TypeInfo {
        self.info
    }

    fn to_text(&self, value: &dyn Reflect) -> Result<String, MapperError> {
        self.enum_info
            .index_of(value)
            .and_then(|index| self.enum_info.variant_at(index))
            .map(|variant| variant.serialized_name().to_owned())
            .ok_or_else(|| {
                MapperError::unsupported(format!(
                    "`{}` is not a variant of `{}`",
                    value.reflect_type_path(),
                    self.info.type_path()
                ))
            })
    }

    fn from_text(&self, text: &str) -> Result<Box<dyn Reflect>, MapperError> {
        self.by_name
            .get(text)
            .and_then(|index| self.enum_info.from_index(*index))
            .ok_or_else(|| MapperError::Conversion {
                type_path: self.info.type_path(),
                text: text.to_owned(),
                source: ConvertError::new("no variant with this name"),
            })
    }
}

#[cfg(test)]
mod tests {
    use jm_reflect::derive::Reflect;
    use jm_reflect::info::Typed;

    use super::EnumAdapter;
    use crate::ErrorKind;
    use crate::adapter::Adapter;

    #[derive(Reflect, Debug, PartialEq)]
    enum Level {
        Low,
        #[reflect(rename = "HIGH")]
        High,
        X,
    }

    #[test]
    fn variants_round_trip_by_serialized_name() {
        let adapter = EnumAdapter::new(Level::type_info()).unwrap();
        for level in [Level::Low, Level::High, Level::X] {
            let text = adapter.to_text(&level).unwrap();
            let back = adapter.from_text(&text).unwrap();
            assert_eq!(back.take::<Level>().ok(), Some(level));
        }
        assert_eq!(adapter.to_text(&Level::High).unwrap(), "HIGH");
    }

    #[test]
    fn unknown_names_fail() {
        let adapter = EnumAdapter::new(Level::type_info()).unwrap();
        let err = adapter.from_text("High").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(EnumAdapter::new(String::type_info()).is_none());
    }
}
