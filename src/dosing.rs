//! Dosing execution engine.
//!
//! ```text
//!          scan: enabled ∧ today ∧ HH:MM ∧ cooldown
//!   IDLE ───────────────────────────────────────────▶ RUNNING
//!    ▲   start_manual / start_calibration_run            │
//!    │                                       elapsed ≥ duration
//!    │                                                   ▼
//!    └────────────────────── same tick ──────────── COMPLETE
//! ```
//!
//! COMPLETE is only passed through: the tick that stops the pump also
//! releases the reservation.
//!
//! The engine is the only owner of the pump outputs.  A run started from
//! any source reserves them until it completes; other requests are
//! refused with [`DoseError::Busy`] and the schedule scan pauses.

use log::{debug, info, warn};

use crate::app::ports::{ActuatorPort, WallClock};
use crate::error::DoseError;
use crate::records::Calibrations;
use crate::schedule::{DosingSchedule, MAX_DOSING_SCHEDULES, is_valid_pump};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseState {
    Idle,
    Running,
    Complete,
}

/// What started a pump run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseSource {
    /// Schedule slot index.
    Schedule(usize),
    Manual,
    Calibration,
}

/// One pump run in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseRun {
    pub pump: u8,
    pub duty: u8,
    pub started_ms: u32,
    pub duration_ms: u32,
    pub amount_dml: u16,
    pub source: DoseSource,
}

impl DoseRun {
    pub fn is_done(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.started_ms) >= self.duration_ms
    }
}

pub struct DosingEngine {
    state: DoseState,
    run: Option<DoseRun>,
    /// Uptime at which each schedule slot last fired.
    last_fired: [Option<u32>; MAX_DOSING_SCHEDULES],
    last_scan_ms: Option<u32>,
    scan_interval_ms: u32,
    cooldown_ms: u32,
    pumps_online: bool,
}

impl DosingEngine {
    pub fn new(scan_interval_ms: u32, cooldown_ms: u32) -> Self {
        Self {
            state: DoseState::Idle,
            run: None,
            last_fired: [None; MAX_DOSING_SCHEDULES],
            last_scan_ms: None,
            scan_interval_ms,
            cooldown_ms,
            pumps_online: true,
        }
    }

    /// With the pumps offline the scan never fires and every request is
    /// refused with [`DoseError::PumpsOffline`].
    pub fn set_pumps_online(&mut self, online: bool) {
        if !online {
            warn!("Pump outputs offline, dosing disabled");
        }
        self.pumps_online = online;
    }

    pub fn state(&self) -> DoseState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state != DoseState::Idle
    }

    pub fn active_run(&self) -> Option<&DoseRun> {
        self.run.as_ref()
    }

    /// Forget cooldowns after the schedule list was rewritten (slot
    /// indices no longer refer to the same records).
    pub fn reset_cooldowns(&mut self) {
        self.last_fired = [None; MAX_DOSING_SCHEDULES];
    }

    /// Slot `index` was deleted and later slots moved down by one; their
    /// cooldowns move with them.
    pub fn remove_slot(&mut self, index: usize) {
        if index >= MAX_DOSING_SCHEDULES {
            return;
        }
        self.last_fired.copy_within(index + 1.., index);
        self.last_fired[MAX_DOSING_SCHEDULES - 1] = None;
    }

    // ── Schedule scan ─────────────────────────────────────────

    /// Start the first due schedule, at most once per scan interval.
    ///
    /// Nothing fires while a run is active or without a wall clock.
    pub fn scan(
        &mut self,
        now_ms: u32,
        wall: Option<&WallClock>,
        schedules: &[DosingSchedule],
        cals: &Calibrations,
        hw: &mut impl ActuatorPort,
    ) -> Option<DoseRun> {
        if self.state != DoseState::Idle || !self.pumps_online {
            return None;
        }
        if let Some(last) = self.last_scan_ms {
            if now_ms.wrapping_sub(last) < self.scan_interval_ms {
                return None;
            }
        }
        self.last_scan_ms = Some(now_ms);
        let wall = wall?;

        for (slot, schedule) in schedules.iter().enumerate().take(MAX_DOSING_SCHEDULES) {
            if !schedule.is_due(wall) || !self.cooled_down(slot, now_ms) {
                continue;
            }
            let Some(cal) = cals.for_pump(schedule.pump) else {
                warn!("Schedule {slot} names invalid pump {}", schedule.pump);
                continue;
            };
            let Some(duration_ms) = cal.run_duration_ms(schedule.amount_dml) else {
                warn!("Schedule {slot} skipped: pump {} has no flow rate", schedule.pump);
                continue;
            };
            self.last_fired[slot] = Some(now_ms);
            let run = DoseRun {
                pump: schedule.pump,
                duty: cal.pwm_percent,
                started_ms: now_ms,
                duration_ms,
                amount_dml: schedule.amount_dml,
                source: DoseSource::Schedule(slot),
            };
            self.begin(run, hw);
            return Some(run);
        }
        None
    }

    fn cooled_down(&self, slot: usize, now_ms: u32) -> bool {
        match self.last_fired[slot] {
            Some(at) => now_ms.wrapping_sub(at) >= self.cooldown_ms,
            None => true,
        }
    }

    // ── Requests ──────────────────────────────────────────────

    /// Reserve the pumps for a manual dose of `amount_dml`.
    pub fn start_manual(
        &mut self,
        now_ms: u32,
        pump: u8,
        amount_dml: u16,
        cals: &Calibrations,
        hw: &mut impl ActuatorPort,
    ) -> Result<DoseRun, DoseError> {
        self.check_available()?;
        if amount_dml == 0 {
            return Err(DoseError::ZeroAmount);
        }
        let cal = cals.for_pump(pump).ok_or(DoseError::InvalidPump(pump))?;
        let duration_ms = cal
            .run_duration_ms(amount_dml)
            .ok_or(DoseError::NoFlowRate(pump))?;
        let run = DoseRun {
            pump,
            duty: cal.pwm_percent,
            started_ms: now_ms,
            duration_ms,
            amount_dml,
            source: DoseSource::Manual,
        };
        self.begin(run, hw);
        Ok(run)
    }

    /// Reserve the pumps for a timed calibration run at the stored duty.
    pub fn start_calibration_run(
        &mut self,
        now_ms: u32,
        pump: u8,
        cals: &Calibrations,
        hw: &mut impl ActuatorPort,
    ) -> Result<DoseRun, DoseError> {
        self.check_available()?;
        if !is_valid_pump(pump) {
            return Err(DoseError::InvalidPump(pump));
        }
        let cal = cals.for_pump(pump).ok_or(DoseError::InvalidPump(pump))?;
        let run = DoseRun {
            pump,
            duty: cal.pwm_percent,
            started_ms: now_ms,
            duration_ms: u32::from(cal.time_ms),
            amount_dml: 0,
            source: DoseSource::Calibration,
        };
        self.begin(run, hw);
        Ok(run)
    }

    fn check_available(&self) -> Result<(), DoseError> {
        if !self.pumps_online {
            return Err(DoseError::PumpsOffline);
        }
        if self.is_busy() {
            return Err(DoseError::Busy);
        }
        Ok(())
    }

    fn begin(&mut self, run: DoseRun, hw: &mut impl ActuatorPort) {
        info!(
            "Dosing pump {} for {} ms at {}% ({:?})",
            run.pump, run.duration_ms, run.duty, run.source
        );
        hw.set_pump(run.pump, run.duty);
        self.run = Some(run);
        self.state = DoseState::Running;
    }

    // ── Execution ─────────────────────────────────────────────

    /// Advance the state machine.  Returns the run that just completed.
    pub fn tick(&mut self, now_ms: u32, hw: &mut impl ActuatorPort) -> Option<DoseRun> {
        match self.state {
            DoseState::Idle => None,
            DoseState::Running => {
                let run = self.run?;
                if !run.is_done(now_ms) {
                    return None;
                }
                hw.set_pump(run.pump, 0);
                info!(
                    "Pump {} stopped after {} ms",
                    run.pump,
                    now_ms.wrapping_sub(run.started_ms)
                );
                debug!("Dose complete, engine idle");
                self.run = None;
                self.state = DoseState::Idle;
                Some(run)
            }
            DoseState::Complete => {
                self.run = None;
                self.state = DoseState::Idle;
                None
            }
        }
    }
}
