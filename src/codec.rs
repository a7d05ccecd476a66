use std::sync::Arc;

use rearch::CapsuleHandle;

pub fn short_code_codec_capsule(_: CapsuleHandle) -> Arc<dyn ShortCodeCodec> {
    Arc::new(Base62Codec)
}

/// Reversible integer-to-token codec.
///
/// `encode` must be deterministic and total over all of i32; `decode` is its
/// inverse. This exists to keep raw sequential-looking integers out of public
/// tokens, not to provide any secrecy.
pub trait ShortCodeCodec: Send + Sync {
    fn encode(&self, short_code: i32) -> String;

    fn decode(&self, token: &str) -> Option<i32>;
}

/// Base62 over the code's u32 bit pattern. Going through the bit pattern
/// keeps negative codes encodable and round-trippable.
pub struct Base62Codec;

impl ShortCodeCodec for Base62Codec {
    fn encode(&self, short_code: i32) -> String {
        base62::encode(short_code.cast_unsigned())
    }

    fn decode(&self, token: &str) -> Option<i32> {
        let value = base62::decode(token).ok()?;
        u32::try_from(value).ok().map(u32::cast_signed)
    }
}
