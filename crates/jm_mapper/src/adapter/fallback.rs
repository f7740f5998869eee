use jm_reflect::Reflect;
use jm_reflect::info::TypeInfo;

use crate::MapperError;
use crate::adapter::Adapter;

/// Last-resort adapter for scalars without a converter.
///
/// Writing never fails: the value's display form is used, or its type path
/// when it has none. Reading always fails with
/// [`MapperError::MissingConverter`].
pub struct FallbackAdapter {
    info: &'static TypeInfo,
}

impl FallbackAdapter {
    #[inline]
    pub const fn new(info: &'static TypeInfo) -> Self {
        Self { info }
    }
}

impl Adapter for FallbackAdapter {
    #[inline]
    fn type_info(&self) -> &'static TypeInfo {
        self.info
    }

    fn to_text(&self, value: &dyn Reflect) -> Result<String, MapperError> {
        let info = value.reflect_type_info();
        Ok(info
            .display(value)
            .unwrap_or_else(|| info.type_path().to_owned()))
    }

    fn from_text(&self, _text: &str) -> Result<Box<dyn Reflect>, MapperError> {
        Err(MapperError::MissingConverter {
            type_path: self.info.type_path(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use jm_reflect::info::Typed;

    use super::FallbackAdapter;
    use crate::ErrorKind;
    use crate::adapter::Adapter;

    #[test]
    fn writes_display_and_refuses_to_read() {
        let adapter = FallbackAdapter::new(IpAddr::type_info());
        let addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert_eq!(adapter.to_text(&addr).unwrap(), "127.0.0.1");

        let err = adapter.from_text("127.0.0.1").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Mapping);

        let debug = FallbackAdapter::new(Duration::type_info());
        assert_eq!(debug.to_text(&Duration::from_secs(1)).unwrap(), "1s");
    }
}
