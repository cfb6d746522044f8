// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use frameflow::constants::FrameRatePreset;

#[test]
fn test_frame_rate_presets() {
    assert_eq!(FrameRatePreset::ALL.len(), 4);
    assert_eq!(FrameRatePreset::default(), FrameRatePreset::Fps30);
}

#[test]
fn test_frame_rate_ordering() {
    // Presets are ordered from slowest to fastest cadence
    let mut prev_interval = std::time::Duration::MAX;
    for preset in FrameRatePreset::ALL {
        let interval = preset.frame_interval();
        assert!(
            interval < prev_interval,
            "Presets should be ordered from slowest to fastest"
        );
        prev_interval = interval;
    }
}

#[test]
fn test_frame_rate_display_names() {
    for preset in FrameRatePreset::ALL {
        assert!(
            !preset.display_name().is_empty(),
            "Preset {:?} has empty display name",
            preset
        );
        assert_eq!(FrameRatePreset::from_fps(preset.fps()), Some(preset));
    }
}
