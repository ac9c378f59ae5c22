// Unit tests for domain models

#[cfg(test)]
mod tests {
    use crate::document::ids::TrackUidId;
    use crate::domain::errors::*;
    use crate::domain::model::*;

    fn ms(value: i64) -> i64 {
        value * NS_PER_MS
    }

    #[test]
    fn test_interval_rejects_reversed_bounds() {
        assert!(Interval::new(ms(10), ms(5)).is_err());
        let empty = Interval::new(ms(5), ms(5)).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.duration(), 0);
    }

    #[test]
    fn test_interval_gap_and_contains() {
        let a = Interval::new(0, ms(100)).unwrap();
        let b = Interval::new(ms(150), ms(300)).unwrap();
        assert_eq!(a.gap_to(&b), ms(50));
        assert!(a.contains(0));
        assert!(!a.contains(ms(100)));
    }

    #[test]
    fn test_interval_display() {
        let interval = Interval::new(ms(180), ms(420)).unwrap();
        assert_eq!(interval.to_string(), "[00:00:00.180, 00:00:00.420)");
    }

    #[test]
    fn test_sample_block_length_checked() {
        let info = BlockDescription::new(4, 2, 48_000).unwrap();
        assert!(SampleBlock::new(info, vec![0.0; 7]).is_err());
        assert!(SampleBlock::new(info, vec![0.0; 8]).is_ok());
    }

    #[test]
    fn test_block_description_rejects_zero_channels() {
        let err = BlockDescription::new(4, 0, 48_000).unwrap_err();
        assert!(matches!(err, DomainError::BadArgs(_)));
    }

    #[test]
    fn test_channel_rms() {
        let info = BlockDescription::new(4, 2, 48_000).unwrap();
        let data = vec![0.5, 0.0, -0.5, 0.0, 0.5, 0.0, -0.5, 0.0];
        let block = SampleBlock::new(info, data).unwrap();
        assert!((block.channel_rms(0) - 0.5).abs() < 1e-9);
        assert_eq!(block.channel_rms(1), 0.0);
    }

    #[test]
    fn test_activity_matrix_lookup() {
        let matrix = ActivityMatrix {
            active: vec![vec![false, true], vec![true, true], vec![false, false]],
            block_times: vec![0, ms(10), ms(20)],
            file_length_ns: ms(20),
        };
        assert!(matrix.validate().is_ok());
        assert!(matrix.is_active(1, 0));
        assert!(!matrix.is_active(0, 5));
        assert!(!matrix.is_active(9, 0));
        assert_eq!(matrix.first_block_at_or_after(ms(5)), 1);
        assert_eq!(matrix.first_block_at_or_after(ms(10)), 1);
        assert_eq!(matrix.first_block_at_or_after(ms(30)), 3);
    }

    #[test]
    fn test_activity_matrix_length_mismatch() {
        let matrix = ActivityMatrix {
            active: vec![vec![true]],
            block_times: vec![0, 1],
            file_length_ns: 1,
        };
        assert!(matches!(matrix.validate(), Err(DomainError::InvalidFormat(_))));
    }

    #[test]
    fn test_channel_map_serializes_as_entries() {
        let map: ChannelMap = vec![(TrackUidId(2), 1), (TrackUidId(1), 0)].into_iter().collect();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json[0]["track_uid"], "ATU_00000001");
        assert_eq!(json[1]["channel"], 1);
        let back: ChannelMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
        assert_eq!(back.max_channel(), Some(1));
    }

    #[test]
    fn test_profile_defaults() {
        let limits = ProductionProfileLimits::default();
        assert_eq!(limits.min_gap_ns, ms(1000));
        assert_eq!(limits.lead_in_ns, ms(20));
        assert_eq!(limits.lead_out_ns, ms(20));
        assert_eq!(limits.min_duration_ns, ms(100));
        assert_eq!(limits.max_gap_ns, ms(5000));
        assert!(limits.crop_objects);
    }

    #[test]
    fn test_profile_accepts_gap_aliases() {
        let limits: ProductionProfileLimits =
            toml::from_str("pre_gap_ns = 5000000\npost_gap_ns = 7000000").unwrap();
        assert_eq!(limits.lead_in_ns, ms(5));
        assert_eq!(limits.lead_out_ns, ms(7));
        assert_eq!(limits.min_gap_ns, ms(1000));
    }

    #[test]
    fn test_profile_rejects_negative() {
        let limits = ProductionProfileLimits {
            lead_in_ns: -1,
            ..ProductionProfileLimits::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_analyser_settings_validation() {
        assert!(AnalyserSettings::default().validate().is_ok());
        let bad = AnalyserSettings {
            threshold: f64::NAN,
            ..AnalyserSettings::default()
        };
        assert!(bad.validate().is_err());
        let bad = AnalyserSettings {
            block_size: 0,
            ..AnalyserSettings::default()
        };
        assert!(bad.validate().is_err());
    }
}
