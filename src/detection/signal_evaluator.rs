use tracing::debug;

use crate::models::request::RequestHeaders;
use crate::models::signal::{Category, Signal};
use crate::models::verdict::Verdict;

use super::bot_patterns;
use super::bundle::Bundle;

const MATH_ACOS_HALF: f64 = 1.047_197_551_196_597_9;

/// Stateless scoring of a full evidence bundle: headers plus the
/// browser-environment fingerprint POSTed to `/api/bot` (spec §4.2).
///
/// Every rule reads the bundle defensively through [`Bundle`] — a missing
/// field is never a panic, only a specific per-rule default.
pub struct SignalEvaluator;

impl SignalEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, bundle: &Bundle, headers: &RequestHeaders) -> Verdict {
        let mut signals = Vec::with_capacity(71);

        automation_rules(bundle, &mut signals);
        essential_data_rules(bundle, &mut signals);
        browser_feature_rules(bundle, &mut signals);
        webgl_rules(bundle, &mut signals);
        screen_rules(bundle, &mut signals);
        consistency_rules(bundle, headers, &mut signals);
        timing_rules(bundle, &mut signals);
        fingerprint_rules(bundle, &mut signals);
        header_family_rules(bundle, headers, &mut signals);

        let detected: Vec<&str> = signals.iter().filter(|s| s.detected).map(|s| s.name).collect();
        if !detected.is_empty() {
            debug!(rules = ?detected, "signal evaluator flagged signals");
        }

        Verdict::from_signals(signals)
    }

    /// §4.2 early-reject: the bundle lacks prerequisite client evidence, or
    /// the embedded challenge outcome is not explicitly valid. Checked by
    /// the HTTP layer before calling [`Self::evaluate`] at all.
    pub fn needs_early_reject(bundle: &Bundle) -> bool {
        let has_screen_width = bundle.get_number("screen.width").map(|w| w > 0.0).unwrap_or(false);
        let has_ua = bundle.get_str_opt("navigator.userAgent").is_some();
        let has_window = bundle.has_object("window");
        let challenge_valid = bundle.get_bool("jsChallenge.valid").unwrap_or(false);

        !has_screen_width || !has_ua || !has_window || !challenge_valid
    }

    pub fn early_reject_verdict() -> Verdict {
        Verdict::synthetic(
            "jsExecutionFailed",
            Category::Automation,
            1005,
            "Prerequisite client evidence missing or JS challenge not valid",
        )
    }
}

impl Default for SignalEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_chrome_ua(ua: &str) -> bool {
    let lower = ua.to_ascii_lowercase();
    lower.contains("chrome") && !lower.contains("edg") && !lower.contains("opr")
}

fn ua_is_mobile(ua: &str) -> bool {
    let lower = ua.to_ascii_lowercase();
    lower.contains("mobile") || lower.contains("android") || lower.contains("iphone")
}

fn automation_rules(bundle: &Bundle, out: &mut Vec<Signal>) {
    let webdriver = bundle.is_true("navigator.webdriver") || bundle.is_true("features.webdriver");
    out.push(Signal::new(
        "webdriver",
        30,
        webdriver,
        Category::Automation,
        "navigator.webdriver reports true",
        "navigator.webdriver is false or absent",
    ));

    out.push(Signal::new(
        "phantom",
        30,
        bundle.is_true("features.phantom"),
        Category::Automation,
        "PhantomJS marker present",
        "No PhantomJS marker",
    ));
    out.push(Signal::new(
        "nightmare",
        30,
        bundle.is_true("features.nightmare"),
        Category::Automation,
        "NightmareJS marker present",
        "No NightmareJS marker",
    ));
    out.push(Signal::new(
        "selenium",
        30,
        bundle.is_true("features.selenium"),
        Category::Automation,
        "Selenium marker present",
        "No Selenium marker",
    ));
    out.push(Signal::new(
        "domAutomation",
        30,
        bundle.is_true("features.domAutomation"),
        Category::Automation,
        "DOM automation marker present",
        "No DOM automation marker",
    ));

    let ua = bundle.get_string("navigator.userAgent", "");
    let headless = ua.to_ascii_lowercase().contains("headless");
    out.push(Signal::new(
        "headlessUA",
        25,
        headless,
        Category::Automation,
        "navigator.userAgent contains 'headless'",
        "navigator.userAgent does not mention headless",
    ));

    let no_browser_data = !bundle.has_object("screen") && !bundle.has_object("window") && !bundle.has_object("navigator");
    out.push(Signal::new(
        "noBrowserData",
        50,
        no_browser_data,
        Category::Automation,
        "Bundle lacks screen, window, and navigator objects entirely",
        "Bundle carries at least one of screen, window, navigator",
    ));

    let challenge_failed = !bundle.is_true("jsChallenge.valid");
    out.push(Signal::new(
        "jsChallengeFailed",
        35,
        challenge_failed,
        Category::Automation,
        "JS execution challenge absent or invalid",
        "JS execution challenge valid",
    ));
}

/// Only meaningful once `noBrowserData` is known false — gated by the
/// caller's check, per §4.2 ("only fire if noBrowserData is false").
fn essential_data_rules(bundle: &Bundle, out: &mut Vec<Signal>) {
    let no_browser_data = !bundle.has_object("screen") && !bundle.has_object("window") && !bundle.has_object("navigator");
    if no_browser_data {
        return;
    }

    out.push(Signal::new(
        "noScreenData",
        25,
        !bundle.has_object("screen"),
        Category::General,
        "screen object missing",
        "screen object present",
    ));
    out.push(Signal::new(
        "noWindowData",
        20,
        !bundle.has_object("window"),
        Category::General,
        "window object missing",
        "window object present",
    ));
    out.push(Signal::new(
        "noNavigatorData",
        25,
        !bundle.has_object("navigator"),
        Category::General,
        "navigator object missing",
        "navigator object present",
    ));
    out.push(Signal::new(
        "noTimezoneData",
        15,
        bundle.get_str_opt("timezone.timezone").is_none(),
        Category::General,
        "timezone object missing",
        "timezone object present",
    ));
}

fn browser_feature_rules(bundle: &Bundle, out: &mut Vec<Signal>) {
    out.push(Signal::new(
        "noPlugins",
        15,
        bundle.get_number("plugins.length").unwrap_or(0.0) == 0.0,
        Category::BrowserFeatures,
        "No browser plugins reported",
        "At least one browser plugin reported",
    ));

    let lang_count = bundle.array_len("navigator.languages").unwrap_or(0);
    out.push(Signal::new(
        "noLanguages",
        15,
        lang_count == 0,
        Category::BrowserFeatures,
        "navigator.languages empty or absent",
        "navigator.languages populated",
    ));

    let ua = bundle.get_string("navigator.userAgent", "");
    let chrome_ua = is_chrome_ua(&ua);
    out.push(Signal::new(
        "missingChrome",
        20,
        chrome_ua && !bundle.is_true("features.windowChrome"),
        Category::BrowserFeatures,
        "Chrome User-Agent but window.chrome absent",
        "window.chrome present, or UA is not Chrome",
    ));

    out.push(Signal::new(
        "noPermissionsAPI",
        10,
        !bundle.is_true("features.permissionsQuery"),
        Category::BrowserFeatures,
        "Permissions API unavailable",
        "Permissions API available",
    ));
    out.push(Signal::new(
        "noNotifications",
        5,
        !bundle.is_true("features.notifications"),
        Category::BrowserFeatures,
        "Notifications API unavailable",
        "Notifications API available",
    ));
    out.push(Signal::new(
        "noWebRTC",
        8,
        !bundle.is_true("features.webRTC"),
        Category::BrowserFeatures,
        "WebRTC unavailable",
        "WebRTC available",
    ));
    out.push(Signal::new(
        "noIndexedDB",
        8,
        !bundle.is_true("features.indexedDB"),
        Category::BrowserFeatures,
        "IndexedDB unavailable",
        "IndexedDB available",
    ));
    out.push(Signal::new(
        "noLocalStorage",
        10,
        !bundle.is_true("features.localStorage"),
        Category::BrowserFeatures,
        "localStorage unavailable",
        "localStorage available",
    ));
    out.push(Signal::new(
        "noSessionStorage",
        10,
        !bundle.is_true("features.sessionStorage"),
        Category::BrowserFeatures,
        "sessionStorage unavailable",
        "sessionStorage available",
    ));
    out.push(Signal::new(
        "noBattery",
        2,
        bundle.get("battery.error").is_some(),
        Category::BrowserFeatures,
        "Battery API reported an error",
        "Battery API did not error",
    ));

    let has_media_devices = bundle.has_object("mediaDevices");
    out.push(Signal::new(
        "noMediaDevices",
        5,
        !has_media_devices,
        Category::BrowserFeatures,
        "mediaDevices object absent",
        "mediaDevices object present",
    ));
    if has_media_devices {
        let zero_devices = bundle.get_number("mediaDevices.audioinput").unwrap_or(0.0) == 0.0
            && bundle.get_number("mediaDevices.audiooutput").unwrap_or(0.0) == 0.0
            && bundle.get_number("mediaDevices.videoinput").unwrap_or(0.0) == 0.0;
        out.push(Signal::new(
            "zeroMediaDevices",
            8,
            zero_devices,
            Category::BrowserFeatures,
            "mediaDevices enumerated zero input/output devices",
            "At least one media device enumerated",
        ));
    }

    out.push(Signal::new(
        "noSpeechVoices",
        3,
        bundle.get_number("speechVoices.count").unwrap_or(0.0) == 0.0,
        Category::BrowserFeatures,
        "No speech synthesis voices available",
        "At least one speech synthesis voice available",
    ));

    if chrome_ua {
        out.push(Signal::new(
            "noConnectionAPI",
            5,
            bundle.is_missing("connection"),
            Category::BrowserFeatures,
            "navigator.connection unavailable (Chrome)",
            "navigator.connection available",
        ));
    }

    let font_count = bundle.get_number("fonts.length").unwrap_or(0.0) as i64;
    out.push(Signal::new(
        "noFonts",
        10,
        font_count == 0,
        Category::BrowserFeatures,
        "No fonts detected",
        "Fonts detected",
    ));
    out.push(Signal::new(
        "fewFonts",
        5,
        (1..=4).contains(&font_count),
        Category::BrowserFeatures,
        format!("Only {} fonts detected", font_count),
        "Font count unremarkable",
    ));

    out.push(Signal::new(
        "noCanvasHash",
        8,
        bundle.get_str_opt("canvas.hash").is_none() || bundle.get("canvas.error").is_some(),
        Category::BrowserFeatures,
        "Canvas fingerprint unavailable",
        "Canvas fingerprint computed",
    ));
    out.push(Signal::new(
        "audioError",
        5,
        bundle.get("audio.error").is_some(),
        Category::BrowserFeatures,
        "AudioContext fingerprint errored",
        "AudioContext fingerprint did not error",
    ));

    if chrome_ua {
        out.push(Signal::new(
            "noPerformanceMemory",
            5,
            bundle.get_number("performance.jsHeapSizeLimit").is_none(),
            Category::BrowserFeatures,
            "performance.memory unavailable (Chrome)",
            "performance.memory available",
        ));
    }

    out.push(Signal::new(
        "documentHidden",
        8,
        bundle.get_bool("document.hidden").unwrap_or(false),
        Category::BrowserFeatures,
        "document.hidden is true",
        "document.hidden is false",
    ));
    out.push(Signal::new(
        "noGamepadAPI",
        2,
        !bundle.is_true("gamepads.supported"),
        Category::BrowserFeatures,
        "Gamepad API unavailable",
        "Gamepad API available",
    ));
    out.push(Signal::new(
        "keyboardAPIError",
        5,
        bundle.get("keyboard.error").is_some(),
        Category::BrowserFeatures,
        "Keyboard API errored",
        "Keyboard API did not error",
    ));
    out.push(Signal::new(
        "noServiceWorker",
        3,
        !bundle.is_true("features.serviceWorker"),
        Category::BrowserFeatures,
        "Service workers unavailable",
        "Service workers available",
    ));
    out.push(Signal::new(
        "noWebAssembly",
        5,
        !bundle.is_true("features.WebAssembly"),
        Category::BrowserFeatures,
        "WebAssembly unavailable",
        "WebAssembly available",
    ));
    out.push(Signal::new(
        "noBluetooth",
        2,
        !bundle.is_true("features.bluetooth"),
        Category::BrowserFeatures,
        "Web Bluetooth unavailable",
        "Web Bluetooth available",
    ));
    out.push(Signal::new(
        "noUSB",
        2,
        !bundle.is_true("features.usb"),
        Category::BrowserFeatures,
        "WebUSB unavailable",
        "WebUSB available",
    ));
    out.push(Signal::new(
        "noCredentials",
        3,
        !bundle.is_true("features.credentials"),
        Category::BrowserFeatures,
        "Credential Management API unavailable",
        "Credential Management API available",
    ));
}

fn webgl_rules(bundle: &Bundle, out: &mut Vec<Signal>) {
    let renderer = bundle
        .get_str_opt("webgl.unmaskedRenderer")
        .or_else(|| bundle.get_str_opt("webgl.renderer"))
        .unwrap_or("")
        .to_ascii_lowercase();
    let software_renderer =
        renderer.contains("swiftshader") || renderer.contains("llvmpipe") || renderer.contains("mesa");
    out.push(Signal::new(
        "softwareRenderer",
        20,
        software_renderer,
        Category::Webgl,
        format!("WebGL renderer '{}' is a software rasterizer", renderer),
        "WebGL renderer is not a known software rasterizer",
    ));

    let has_webgl_error = bundle.get("webgl.error").is_some();
    out.push(Signal::new(
        "noWebGLRenderer",
        10,
        !has_webgl_error && renderer.is_empty(),
        Category::Webgl,
        "WebGL available but reported an empty renderer string",
        "WebGL renderer string present or WebGL errored",
    ));

    let vendor = bundle
        .get_str_opt("webgl.unmaskedVendor")
        .or_else(|| bundle.get_str_opt("webgl.vendor"))
        .unwrap_or("")
        .to_ascii_lowercase();
    out.push(Signal::new(
        "softwareVendor",
        15,
        vendor.contains("brian paul") || vendor.contains("mesa"),
        Category::Webgl,
        format!("WebGL vendor '{}' names a software implementation", vendor),
        "WebGL vendor does not name a software implementation",
    ));

    out.push(Signal::new(
        "noWebGLExtensions",
        8,
        bundle.array_len("webgl.extensions").unwrap_or(0) == 0,
        Category::Webgl,
        "No WebGL extensions reported",
        "WebGL extensions reported",
    ));

    let ua = bundle.get_string("navigator.userAgent", "");
    if is_chrome_ua(&ua) {
        out.push(Signal::new(
            "noWebGL2",
            3,
            bundle.get("webgl2.error").is_some(),
            Category::Webgl,
            "WebGL2 context errored (Chrome)",
            "WebGL2 context did not error",
        ));
    }
}

fn screen_rules(bundle: &Bundle, out: &mut Vec<Signal>) {
    let width = bundle.get_number("screen.width").unwrap_or(0.0);
    let height = bundle.get_number("screen.height").unwrap_or(0.0);
    out.push(Signal::new(
        "zeroScreenSize",
        15,
        width == 0.0 || height == 0.0,
        Category::Screen,
        "screen.width or screen.height is zero",
        "screen dimensions are non-zero",
    ));
    out.push(Signal::new(
        "defaultScreenSize",
        10,
        width == 800.0 && height == 600.0,
        Category::Screen,
        "screen is exactly the default 800x600",
        "screen size is not the default 800x600",
    ));

    let inner_w = bundle.get_number("window.innerWidth").unwrap_or(0.0);
    let inner_h = bundle.get_number("window.innerHeight").unwrap_or(0.0);
    let outer_w = bundle.get_number("window.outerWidth").unwrap_or(0.0);
    let outer_h = bundle.get_number("window.outerHeight").unwrap_or(0.0);
    let no_chrome = inner_w == outer_w && outer_w > 0.0 && inner_h == outer_h;
    out.push(Signal::new(
        "noWindowChrome",
        10,
        no_chrome,
        Category::Screen,
        "Inner and outer window dimensions are identical (no browser chrome)",
        "Inner and outer window dimensions differ",
    ));

    let dpr = bundle.get_number("screen.devicePixelRatio").unwrap_or(1.0);
    out.push(Signal::new(
        "unusualDPR",
        5,
        dpr < 0.5 || dpr > 4.0,
        Category::Screen,
        format!("devicePixelRatio {} is outside [0.5, 4]", dpr),
        "devicePixelRatio within expected range",
    ));

    let depth = bundle.get_number("screen.colorDepth").unwrap_or(24.0);
    out.push(Signal::new(
        "lowColorDepth",
        5,
        depth < 24.0,
        Category::Screen,
        format!("screen.colorDepth {} is below 24", depth),
        "screen.colorDepth is at least 24",
    ));
}

fn consistency_rules(bundle: &Bundle, headers: &RequestHeaders, out: &mut Vec<Signal>) {
    let ua = bundle.get_string("navigator.userAgent", "");
    let mobile = ua_is_mobile(&ua);
    let max_touch_points = bundle.get_number("touch.maxTouchPoints").unwrap_or(0.0);

    out.push(Signal::new(
        "mobileNoTouch",
        15,
        mobile && max_touch_points == 0.0,
        Category::Consistency,
        "Mobile User-Agent but maxTouchPoints is zero",
        "Touch capability matches UA mobility",
    ));
    out.push(Signal::new(
        "desktopTouchMismatch",
        5,
        !mobile && max_touch_points > 0.0,
        Category::Consistency,
        "Desktop User-Agent but touch points reported",
        "Touch capability matches UA mobility",
    ));

    let app_name = bundle.get_string("navigator.appName", "");
    let product = bundle.get_string("navigator.product", "");
    out.push(Signal::new(
        "navigatorInconsistency",
        5,
        app_name == "Netscape" && product != "Gecko",
        Category::Consistency,
        "navigator.appName is Netscape but navigator.product is not Gecko",
        "navigator.appName/product combination is consistent",
    ));

    let header_ua = headers.user_agent().unwrap_or("");
    out.push(Signal::new(
        "uaMismatch",
        20,
        !ua.is_empty() && header_ua != ua,
        Category::Consistency,
        "HTTP User-Agent header differs from navigator.userAgent",
        "HTTP User-Agent header matches navigator.userAgent",
    ));

    let header_lang_primary = headers
        .get("accept-language")
        .and_then(|v| v.split([',', ';']).next())
        .map(|t| primary_subtag(t.trim()))
        .unwrap_or_default();
    let nav_lang_primary = primary_subtag(&bundle.get_string("navigator.language", ""));
    let language_mismatch = !header_lang_primary.is_empty()
        && !nav_lang_primary.is_empty()
        && header_lang_primary != nav_lang_primary;
    out.push(Signal::new(
        "languageMismatch",
        10,
        language_mismatch,
        Category::Consistency,
        format!(
            "Accept-Language primary tag '{}' differs from navigator.language primary tag '{}'",
            header_lang_primary, nav_lang_primary
        ),
        "Accept-Language and navigator.language agree on primary tag",
    ));

    let platform = bundle.get_string("navigator.platform", "").to_ascii_lowercase();
    let ua_lower = ua.to_ascii_lowercase();
    let names_windows = ua_lower.contains("windows");
    let names_mac = ua_lower.contains("mac os") || ua_lower.contains("macintosh");
    let names_linux = ua_lower.contains("linux") && !mobile;
    let platform_mismatch = (names_windows && !platform.contains("win"))
        || (names_mac && !platform.contains("mac"))
        || (names_linux && !platform.contains("linux"));
    out.push(Signal::new(
        "platformMismatch",
        15,
        platform_mismatch,
        Category::Consistency,
        "User-Agent OS name disagrees with navigator.platform",
        "User-Agent OS name agrees with navigator.platform (or none claimed)",
    ));

    let tz = bundle.get_string("timezone.timezone", "");
    let offset = bundle.get_number("timezone.offset").unwrap_or(0.0);
    let tz_inconsistent = (tz.starts_with("America/") && offset < 0.0)
        || (tz.starts_with("Europe/") && offset > 60.0);
    out.push(Signal::new(
        "timezoneInconsistent",
        10,
        tz_inconsistent,
        Category::Consistency,
        format!("Timezone '{}' inconsistent with UTC offset {}", tz, offset),
        "Timezone and UTC offset agree",
    ));

    let ua_platform = bundle.get_string("userAgentData.platform", "").to_ascii_lowercase();
    let client_hints_mismatch =
        platform.contains("win") && !ua_platform.is_empty() && !ua_platform.contains("win");
    out.push(Signal::new(
        "clientHintsMismatch",
        15,
        client_hints_mismatch,
        Category::Consistency,
        "navigator.platform names Windows but userAgentData.platform disagrees",
        "Client Hints platform agrees with navigator.platform (or absent)",
    ));

    let vendor = bundle.get_string("navigator.vendor", "");
    let chrome_ua = is_chrome_ua(&ua);
    let safari_ua = ua_lower.contains("safari") && !ua_lower.contains("chrome");
    let vendor_mismatch =
        (chrome_ua && !vendor.contains("Google")) || (safari_ua && !vendor.contains("Apple"));
    out.push(Signal::new(
        "vendorMismatch",
        10,
        vendor_mismatch,
        Category::Consistency,
        format!("User-Agent implies a vendor that navigator.vendor '{}' does not match", vendor),
        "navigator.vendor matches what the User-Agent implies",
    ));

    out.push(Signal::new(
        "productInconsistent",
        3,
        !product.is_empty() && product != "Gecko",
        Category::Consistency,
        format!("navigator.product '{}' is not 'Gecko'", product),
        "navigator.product is Gecko or absent",
    ));
}

/// Primary subtag of a BCP-47-ish language tag: "en-US" -> "en".
fn primary_subtag(tag: &str) -> String {
    tag.split('-').next().unwrap_or("").to_ascii_lowercase()
}

fn timing_rules(bundle: &Bundle, out: &mut Vec<Signal>) {
    let challenge_valid = bundle.is_true("jsChallenge.valid");
    let solve_time = bundle.get_number("jsChallenge.solveTime").unwrap_or(0.0);
    out.push(Signal::new(
        "jsChallengeTimingSuspicious",
        10,
        challenge_valid && solve_time > 30_000.0,
        Category::Timing,
        format!("JS challenge solved in {} ms, longer than 30s", solve_time),
        "JS challenge solve time unremarkable",
    ));

    let nav_start = bundle.get_number("performance.navigationStart");
    let load_end = bundle.get_number("performance.loadEventEnd");
    let load_time = match (nav_start, load_end) {
        (Some(start), Some(end)) => Some(end - start),
        _ => None,
    };
    out.push(Signal::new(
        "negativeLoadTime",
        20,
        load_time.map(|t| t < 0.0).unwrap_or(false),
        Category::Timing,
        "performance.loadEventEnd precedes navigationStart",
        "Load time is non-negative",
    ));
    out.push(Signal::new(
        "zeroLoadTime",
        15,
        load_time.map(|t| t == 0.0).unwrap_or(false),
        Category::Timing,
        "Load time computed as exactly zero",
        "Load time is non-zero",
    ));
}

fn fingerprint_rules(bundle: &Bundle, out: &mut Vec<Signal>) {
    let acos = bundle.get_number("math.acos");
    let inconsistent = acos
        .map(|v| (v - MATH_ACOS_HALF).abs() > 1e-7)
        .unwrap_or(false);
    out.push(Signal::new(
        "mathInconsistent",
        10,
        inconsistent,
        Category::Fingerprint,
        "Math.acos(0.5) deviates from the IEEE-754 reference value",
        "Math.acos(0.5) matches the IEEE-754 reference value",
    ));
}

/// Header-family rules as re-evaluated by the Signal Evaluator. Per spec
/// §9's second open question, these weights are independent of the Header
/// Evaluator's table (same rule names, different numbers) and win on the
/// `/api/bot` path.
fn header_family_rules(bundle: &Bundle, headers: &RequestHeaders, out: &mut Vec<Signal>) {
    out.push(Signal::new(
        "noAcceptLanguage",
        10,
        !headers.contains("accept-language"),
        Category::Headers,
        "Accept-Language header absent",
        "Accept-Language header present",
    ));
    out.push(Signal::new(
        "noAcceptHeader",
        5,
        !headers.contains("accept"),
        Category::Headers,
        "Accept header absent",
        "Accept header present",
    ));

    let ua = headers.user_agent();
    let bot_match = ua.and_then(bot_patterns::first_match);
    out.push(Signal::new(
        "botUserAgent",
        25,
        bot_match.is_some(),
        Category::Headers,
        format!(
            "User-Agent matches known bot pattern '{}'",
            bot_match.unwrap_or("")
        ),
        "User-Agent matches no known bot pattern",
    ));

    let ua_len = ua.map(str::len).unwrap_or(0);
    out.push(Signal::new(
        "shortUserAgent",
        15,
        ua_len > 0 && ua_len < 20,
        Category::Headers,
        format!("User-Agent suspiciously short (len={})", ua_len),
        "User-Agent length unremarkable",
    ));

    out.push(Signal::new(
        "noSecFetch",
        8,
        !headers.has_sec_fetch(),
        Category::Headers,
        "All Sec-Fetch-* headers absent",
        "At least one Sec-Fetch-* header present",
    ));

    let chrome_ua = ua.map(is_chrome_ua).unwrap_or(false);
    if chrome_ua {
        out.push(Signal::new(
            "noSecChUa",
            8,
            !headers.contains("sec-ch-ua"),
            Category::Headers,
            "Sec-CH-UA header absent (Chrome)",
            "Sec-CH-UA header present",
        ));
    }

    out.push(Signal::new(
        "noConnectionHeader",
        3,
        !headers.contains("connection"),
        Category::Headers,
        "Connection header absent",
        "Connection header present",
    ));
    out.push(Signal::new(
        "noCacheControl",
        2,
        !headers.contains("cache-control"),
        Category::Headers,
        "Cache-Control header absent",
        "Cache-Control header present",
    ));

    let _ = bundle; // header-family rules read only the transport headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers_from(pairs: &[(&str, &str)]) -> RequestHeaders {
        let mut h = RequestHeaders::new();
        for (k, v) in pairs {
            h.insert(k, v);
        }
        h
    }

    /// Scenario 5 from spec §8: headless Chrome fingerprint.
    #[test]
    fn headless_chrome_fingerprint_scores_bot() {
        let bundle = Bundle::new(json!({
            "screen": {"width": 1920, "height": 1080},
            "window": {"innerWidth": 1920, "innerHeight": 1080, "outerWidth": 1920, "outerHeight": 1080},
            "navigator": {
                "userAgent": "Mozilla/5.0 HeadlessChrome/120.0.0.0",
                "webdriver": true,
                "platform": "Win32",
                "vendor": "Google Inc.",
                "product": "Gecko",
                "languages": ["en-US"],
                "language": "en-US"
            },
            "webgl": {"unmaskedRenderer": "Google SwiftShader"},
            "plugins": {"length": 0},
            "jsChallenge": {"valid": true, "solveTime": 100}
        }));
        let headers = headers_from(&[(
            "user-agent",
            "Mozilla/5.0 HeadlessChrome/120.0.0.0",
        )]);

        let verdict = SignalEvaluator::new().evaluate(&bundle, &headers);
        let names: Vec<&str> = verdict.signals.iter().map(|s| s.name).collect();
        for expected in ["webdriver", "headlessUA", "softwareRenderer", "missingChrome", "noPlugins"] {
            assert!(names.contains(&expected), "expected {expected} to fire, got {:?}", names);
        }
        assert_eq!(verdict.score, 100.0);
        assert_eq!(verdict.verdict, crate::models::verdict::Classification::Bot);
    }

    #[test]
    fn clean_rich_bundle_without_challenge_needs_early_reject() {
        let bundle = Bundle::new(json!({
            "screen": {"width": 1920, "height": 1080},
            "window": {"innerWidth": 1920, "innerHeight": 1000, "outerWidth": 1920, "outerHeight": 1080},
            "navigator": {"userAgent": "Mozilla/5.0", "webdriver": false}
        }));
        assert!(SignalEvaluator::needs_early_reject(&bundle));
        let verdict = SignalEvaluator::early_reject_verdict();
        assert_eq!(verdict.code, Some(1005));
        assert_eq!(verdict.verdict, crate::models::verdict::Classification::Bot);
    }

    #[test]
    fn empty_bundle_needs_early_reject() {
        let bundle = Bundle::new(json!({}));
        assert!(SignalEvaluator::needs_early_reject(&bundle));
    }

    #[test]
    fn all_signals_length_matches_executed_rule_count() {
        let bundle = Bundle::new(json!({}));
        let headers = RequestHeaders::new();
        let verdict = SignalEvaluator::new().evaluate(&bundle, &headers);
        assert_eq!(verdict.summary.flagged + verdict.summary.passed, verdict.summary.total_checks);
        assert_eq!(verdict.all_signals.len(), verdict.summary.total_checks);
    }

    #[test]
    fn language_mismatch_compares_primary_subtag_only() {
        let bundle = Bundle::new(json!({"navigator": {"language": "en-GB"}}));
        let headers = headers_from(&[("accept-language", "en-US,en;q=0.9")]);
        let verdict = SignalEvaluator::new().evaluate(&bundle, &headers);
        let mismatch = verdict.all_signals.iter().find(|s| s.name == "languageMismatch").unwrap();
        assert!(!mismatch.detected, "en-US and en-GB share primary tag 'en'");
    }
}
