use serde::{Deserialize, Serialize};

/// One of the three audio CPU timers.
///
/// Timers are never ticked cycle by cycle. Instead the elapsed audio CPU cycles are converted
/// into ticks whenever the timer's registers are touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timer {
    // Audio CPU cycles per stage 1 tick, 128 for the 8KHz timers and 16 for the 64KHz timer
    period: u64,
    // 4 bit output counter, cleared on read
    value: u8,
    last_access: u64,
    // Stage 1 ticks not yet divided into an output increment
    internal_counter: u64,
    // Cycles not yet converted into a stage 1 tick
    internal_cycles: u64,
    pub enabled: bool,
    /// A written divider of 0 means 256
    pub divider: u16,
}

impl Timer {
    /// Create a timer that ticks once every `period` audio CPU cycles before division.
    pub fn new(period: u64) -> Timer {
        Timer {
            period,
            value: 0,
            last_access: 0,
            internal_counter: 0,
            internal_cycles: 0,
            enabled: false,
            divider: 256,
        }
    }
    /// Catch the timer up to the given audio CPU timestamp.
    pub fn update(&mut self, timestamp: u64) {
        if !self.enabled {
            return;
        }
        self.internal_cycles += timestamp.saturating_sub(self.last_access);
        self.last_access = timestamp;

        self.internal_counter += self.internal_cycles / self.period;
        self.internal_cycles %= self.period;

        let increment = self.internal_counter / self.divider as u64;
        self.internal_counter %= self.divider as u64;
        self.value = ((self.value as u64 + increment) & 0xF) as u8;
    }
    /// Set the divider from a value written to the timer's target register.
    pub fn set_divider(&mut self, timestamp: u64, value: u8) {
        self.update(timestamp);
        self.divider = if value == 0 { 256 } else { value as u16 };
    }
    /// Turn the timer on.
    ///
    /// The counter is cleared here rather than when the timer is turned off.
    pub fn enable(&mut self, timestamp: u64) {
        self.value = 0;
        self.last_access = timestamp;
        self.enabled = true;
    }
    pub fn disable(&mut self) {
        self.enabled = false;
        self.internal_counter = 0;
        self.internal_cycles = 0;
    }
    /// Read the counter, clearing it.
    pub fn read(&mut self, timestamp: u64) -> u8 {
        self.update(timestamp);
        let v = self.value;
        self.value = 0;
        v
    }
    /// Read the counter without any side effects.
    pub fn peek(&self) -> u8 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_counts_in_closed_form() {
        let mut t = Timer::new(128);
        t.set_divider(0, 2);
        t.enable(0);
        // 5 stage 1 ticks / divider 2 = 2 increments, 1 tick left over
        assert_eq!(t.read(128 * 5), 2);
        // The left over tick and one more make one increment
        assert_eq!(t.read(128 * 6), 1);
        assert_eq!(t.read(128 * 6), 0);
    }

    #[test]
    fn test_value_wraps_at_4_bits() {
        let mut t = Timer::new(16);
        t.set_divider(0, 1);
        t.enable(0);
        assert_eq!(t.read(16 * 17), 1);
    }

    #[test]
    fn test_reset_on_enable_not_disable() {
        let mut t = Timer::new(16);
        t.set_divider(0, 1);
        t.enable(0);
        t.update(16 * 3);
        t.disable();
        // Disabling keeps the counter
        assert_eq!(t.peek(), 3);
        t.enable(10_000);
        assert_eq!(t.peek(), 0);
        assert_eq!(t.read(10_000), 0);
        assert_eq!(t.peek(), 0);
    }

    #[test]
    fn test_disabled_timer_does_not_count() {
        let mut t = Timer::new(128);
        t.set_divider(0, 1);
        assert_eq!(t.read(128 * 100), 0);
    }

    #[test_case(128 ; "8KHz timer")]
    #[test_case(16 ; "64KHz timer")]
    fn test_zero_divider_counts_to_256(period: u64) {
        let mut t = Timer::new(period);
        t.set_divider(0, 0);
        assert_eq!(t.divider, 256);
        t.enable(0);
        assert_eq!(t.read(period * 255), 0);
        assert_eq!(t.read(period * 256), 1);
        assert_eq!(t.read(period * 511), 0);
    }
}
