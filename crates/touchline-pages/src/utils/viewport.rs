//! Viewport classification.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::settings::ViewportSettings;

static TOUCH_USER_AGENT: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?i)android|webos|iphone|ipad|ipod|blackberry|iemobile|opera mini|mobile")
		.expect("touch user agent pattern is valid")
});

/// Layout class of a viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
	Mobile,
	Tablet,
	Desktop,
}

impl DeviceClass {
	/// Classifies `width` against the configured breakpoints.
	pub fn classify(width: u32, breakpoints: &ViewportSettings) -> Self {
		if width <= breakpoints.mobile_max_width {
			Self::Mobile
		} else if width <= breakpoints.tablet_max_width {
			Self::Tablet
		} else {
			Self::Desktop
		}
	}

	pub fn is_mobile(self) -> bool {
		self == Self::Mobile
	}

	/// Mobile or tablet.
	pub fn is_handheld(self) -> bool {
		self != Self::Desktop
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
	Portrait,
	Landscape,
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
}

impl Viewport {
	pub fn new(width: u32, height: u32) -> Self {
		Self { width, height }
	}

	pub fn device_class(&self, breakpoints: &ViewportSettings) -> DeviceClass {
		DeviceClass::classify(self.width, breakpoints)
	}

	/// Square viewports count as landscape.
	pub fn orientation(&self) -> Orientation {
		if self.height > self.width {
			Orientation::Portrait
		} else {
			Orientation::Landscape
		}
	}
}

/// User-agent heuristic for touch-first devices.
pub fn is_touch_device(user_agent: &str) -> bool {
	TOUCH_USER_AGENT.is_match(user_agent)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(320, DeviceClass::Mobile)]
	#[case(767, DeviceClass::Mobile)]
	#[case(768, DeviceClass::Tablet)]
	#[case(991, DeviceClass::Tablet)]
	#[case(992, DeviceClass::Desktop)]
	#[case(1920, DeviceClass::Desktop)]
	fn test_classify_default_breakpoints(#[case] width: u32, #[case] expected: DeviceClass) {
		assert_eq!(
			DeviceClass::classify(width, &ViewportSettings::default()),
			expected
		);
	}

	#[rstest]
	fn test_custom_breakpoints() {
		let breakpoints = ViewportSettings {
			mobile_max_width: 575,
			tablet_max_width: 1199,
		};
		let viewport = Viewport::new(600, 900);

		assert_eq!(viewport.device_class(&breakpoints), DeviceClass::Tablet);
		assert!(viewport.device_class(&breakpoints).is_handheld());
		assert!(!viewport.device_class(&breakpoints).is_mobile());
		assert_eq!(viewport.orientation(), Orientation::Portrait);
		assert_eq!(Viewport::new(800, 800).orientation(), Orientation::Landscape);
	}

	#[rstest]
	#[case(
		"Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15",
		true
	)]
	#[case("Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36", true)]
	#[case(
		"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0",
		false
	)]
	#[case("", false)]
	fn test_is_touch_device(#[case] user_agent: &str, #[case] expected: bool) {
		assert_eq!(is_touch_device(user_agent), expected);
	}
}
