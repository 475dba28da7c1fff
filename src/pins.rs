//! GPIO / peripheral pin assignments for the hydroponics controller board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Rotary encoder (quadrature A/B plus push switch)
// ---------------------------------------------------------------------------

/// Encoder channel A.
pub const ENCODER_CLK_GPIO: i32 = 4;
/// Encoder channel B.
pub const ENCODER_DT_GPIO: i32 = 15;
/// Encoder push switch, active-low with internal pull-up.
pub const ENCODER_SW_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Outlet relays (active HIGH)
// ---------------------------------------------------------------------------

pub const RELAY_1_GPIO: i32 = 14;
pub const RELAY_2_GPIO: i32 = 13;
pub const RELAY_3_GPIO: i32 = 12;
pub const RELAY_4_GPIO: i32 = 11;

/// Relay outputs indexed by `relay - 1`.
pub const RELAY_GPIOS: [i32; 4] = [RELAY_1_GPIO, RELAY_2_GPIO, RELAY_3_GPIO, RELAY_4_GPIO];

// ---------------------------------------------------------------------------
// Peristaltic dosing pumps (LEDC PWM, one channel each)
// ---------------------------------------------------------------------------

pub const PUMP_1_GPIO: i32 = 16;
pub const PUMP_2_GPIO: i32 = 17;
pub const PUMP_3_GPIO: i32 = 18;
pub const PUMP_4_GPIO: i32 = 10;

/// Pump outputs indexed by `pump - 1`.  LEDC channel N drives `PUMP_GPIOS[N]`.
pub const PUMP_GPIOS: [i32; 4] = [PUMP_1_GPIO, PUMP_2_GPIO, PUMP_3_GPIO, PUMP_4_GPIO];

// ---------------------------------------------------------------------------
// Indicator LEDs
// ---------------------------------------------------------------------------

/// Blinks while the control loop is alive.
pub const LED_1_GPIO: i32 = 41;
pub const LED_2_GPIO: i32 = 42;
pub const LED_3_GPIO: i32 = 2;
pub const LED_4_GPIO: i32 = 1;

pub const LED_GPIOS: [i32; 4] = [LED_1_GPIO, LED_2_GPIO, LED_3_GPIO, LED_4_GPIO];
pub const HEARTBEAT_LED_GPIO: i32 = LED_1_GPIO;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the pump motors.
pub const PUMP_PWM_FREQ_HZ: u32 = 1_000;
