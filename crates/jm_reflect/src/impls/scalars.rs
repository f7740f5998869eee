use std::net::IpAddr;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_bigint::BigInt;
use url::Url;
use uuid::Uuid;

use crate::impls::NonGenericTypeInfoCell;
use crate::info::{OpaqueInfo, TypeInfo, Typed};

macro_rules! impl_opaque {
    ($($ty:ty => [$($with:ident),*]),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn type_info() -> &'static TypeInfo {
                    static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                    CELL.get_or_init(|| {
                        TypeInfo::Opaque(OpaqueInfo::new::<$ty>()$(.$with::<$ty>())*)
                    })
                }
            }
        )*
    };
}

impl_opaque! {
    SystemTime => [with_debug],
    Duration => [with_debug, with_default],
    PathBuf => [with_debug, with_default],
    IpAddr => [with_display],
    DateTime<Utc> => [with_display],
    DateTime<FixedOffset> => [with_display],
    NaiveDateTime => [with_display],
    NaiveDate => [with_display],
    NaiveTime => [with_display],
    FixedOffset => [with_display],
    Url => [with_display],
    Uuid => [with_display],
    BigDecimal => [with_display, with_default],
    BigInt => [with_display, with_default],
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use std::str::FromStr;
    use std::time::Duration;

    use crate::info::Typed;

    #[test]
    fn opaque_values_render_through_their_format() {
        let value = BigDecimal::from_str("1.50").unwrap();
        let info = BigDecimal::type_info();
        assert_eq!(info.display(&value).as_deref(), Some("1.50"));

        let default = Duration::type_info().default_value().unwrap();
        assert_eq!(default.take::<Duration>().ok(), Some(Duration::ZERO));
    }
}
