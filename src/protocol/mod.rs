//! Line-oriented text command protocol.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Protocol Stack                         │
//! │                                                            │
//! │  ┌───────────┐   ┌────────────┐   ┌─────────────────────┐  │
//! │  │ LinkPort  │──▶│  Codec     │──▶│  Dispatcher         │  │
//! │  │ (bytes)   │   │ (lines)    │   │  → SessionState     │  │
//! │  └───────────┘   └────────────┘   └─────────────────────┘  │
//! │       ▲                                    │               │
//! │       └──────────── response lines ◀───────┘               │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire grammar (ASCII, `\n` terminated):
//!
//! ```text
//! M<mode_digit><intensity_digits>   "M104" -> mode=1, intensity=4
//! T<duration_digits>                "T30"  -> 30-second timer
//! S                                 status request
//! ```

pub mod codec;
pub mod command;
pub mod dispatcher;
pub mod status;

/// Maximum length of any response line sent back over the link.
pub const RESPONSE_CAPACITY: usize = 64;

/// One outbound response line (without terminator).
pub type Response = heapless::String<RESPONSE_CAPACITY>;
