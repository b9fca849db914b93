#[cfg(test)]
mod test {

    use std::time::Duration;

    use crate::cell::RefreshSchedule;
    use crate::config::types::CellConfig;
    use crate::tests::common::ms;

    #[test]
    fn refresh_happens_safety_margin_before_expiry() {
        let schedule = RefreshSchedule::new(ms(10));
        assert_eq!(schedule.refresh_delay(ms(100)), ms(90));
    }

    #[test]
    fn larger_relative_margin_wins() {
        let schedule = RefreshSchedule::new(ms(10)).with_safety_margin_percent(20);
        assert_eq!(schedule.safety_margin_for(ms(100)), ms(20));
        assert_eq!(schedule.refresh_delay(ms(100)), ms(80));
        // fixed margin dominates short validity
        assert_eq!(schedule.safety_margin_for(ms(20)), ms(10));
    }

    #[test]
    fn validity_within_margin_falls_back_to_floor() {
        let schedule = RefreshSchedule::new(ms(10)).with_min_refresh_interval(ms(3));
        assert_eq!(schedule.refresh_delay(ms(10)), ms(3));
        assert_eq!(schedule.refresh_delay(ms(4)), ms(3));
        assert_eq!(schedule.refresh_delay(ms(0)), ms(3));
    }

    #[test]
    fn retry_after_is_floored() {
        let schedule = RefreshSchedule::default().with_min_refresh_interval(ms(10));
        assert_eq!(schedule.retry_delay(ms(0)), ms(10));
        assert_eq!(schedule.retry_delay(ms(200)), ms(200));
    }

    #[test]
    fn unbounded_validity_does_not_overflow() {
        let schedule = RefreshSchedule::new(ms(10)).with_safety_margin_percent(20);
        let margin = schedule.safety_margin_for(Duration::MAX);
        assert!(margin > ms(10));
        assert_eq!(schedule.refresh_delay(Duration::MAX), Duration::MAX - margin);
        assert_eq!(schedule.retry_delay(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn schedule_from_cell_config() {
        let cfg = CellConfig {
            name: "api".to_string(),
            safety_margin_ms: 250,
            safety_margin_percent: Some(10),
            min_refresh_interval_ms: 50,
        };
        let schedule = RefreshSchedule::from(&cfg);
        assert_eq!(schedule.safety_margin, ms(250));
        assert_eq!(schedule.safety_margin_percent, Some(10));
        assert_eq!(schedule.min_refresh_interval, ms(50));
        assert_eq!(schedule.refresh_delay(ms(10_000)), ms(9_000));
    }
}
