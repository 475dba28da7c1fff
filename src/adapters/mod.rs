//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                      |
//! |------------|---------------|----------------------------------|
//! | `display`  | RenderPort    | Character grid mirrored to log   |
//! | `hardware` | ActuatorPort  | Pump LEDC channels, relay GPIO   |
//! | `input`    | InputPort     | Encoder ISR cell, push switch    |
//! | `log_sink` | EventSink     | Serial log output                |
//! | `nvs`      | ConfigPort    | NVS / in-memory store            |
//! |            | StoragePort   |                                  |
//! | `time`     | ClockPort     | ESP32 timer, system time (RTC)   |

pub mod display;
pub mod hardware;
pub mod input;
pub mod log_sink;
pub mod nvs;
pub mod time;
