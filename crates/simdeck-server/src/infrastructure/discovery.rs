//! Finding, choosing and booting a device.
//!
//! Runs once at startup, before the server binds:
//!
//! 1. probe for `xcrun simctl` and `adb`,
//! 2. list running simulators/emulators and bootable simulators/AVDs,
//! 3. pick one without prompting (see [`Discovery::select`]),
//! 4. boot it if it is not running.
//!
//! Only emulator boot has a deadline: `boot_attempts` polls of `adb devices`,
//! `boot_poll_interval` apart, then [`DriverError::Timeout`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use simdeck_core::{Device, Platform};

use crate::application::driver::DriverError;
use crate::domain::ServerConfig;
use crate::infrastructure::driver::android::ADB;
use crate::infrastructure::driver::ios::XCRUN;
use crate::infrastructure::process::{argv, CommandRunner, SystemRunner};

pub const EMULATOR: &str = "emulator";

/// Pause after opening Simulator.app so its window exists before the first tap.
pub const SIMULATOR_SETTLE: Duration = Duration::from_secs(3);

/// Simulator names tried first when nothing is running.
const PREFERRED_SIMULATORS: &[&str] = &["iPhone 15", "iPhone 14"];

// ── simctl JSON ───────────────────────────────────────────────────────────────

/// `xcrun simctl list devices ... -j`, keyed by runtime identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimctlDeviceList {
    #[serde(default)]
    pub devices: BTreeMap<String, Vec<SimctlDevice>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimctlDevice {
    pub udid: String,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub device_type_identifier: Option<String>,
}

impl SimctlDeviceList {
    pub fn parse(json: &str) -> Result<Self, DriverError> {
        serde_json::from_str(json).map_err(|e| DriverError::Parse {
            what: "simctl device list".into(),
            detail: e.to_string(),
        })
    }

    /// `(runtime, device)` pairs in runtime order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SimctlDevice)> {
        self.devices
            .iter()
            .flat_map(|(runtime, list)| list.iter().map(move |d| (runtime.as_str(), d)))
    }

    pub fn find(&self, udid: &str) -> Option<(&str, &SimctlDevice)> {
        self.entries().find(|(_, d)| d.udid == udid)
    }
}

/// `com.apple.CoreSimulator.SimRuntime.iOS-17-2` → `iOS-17-2`.
pub fn runtime_suffix(runtime: &str) -> &str {
    runtime.rsplit('.').next().unwrap_or(runtime)
}

fn simulator_device(runtime: &str, sim: &SimctlDevice) -> Device {
    Device {
        id: sim.udid.clone(),
        platform: Platform::Ios,
        name: sim.name.clone(),
        model: sim.device_type_identifier.clone(),
        sdk_version: Some(runtime_suffix(runtime).to_string()),
        running: sim.state == "Booted",
    }
}

/// Serials in state `device` from `adb devices` output.
pub fn parse_adb_devices(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split('\t');
            match (cols.next(), cols.next()) {
                (Some(serial), Some(state)) if !serial.is_empty() && state.trim() == "device" => {
                    Some(serial.trim().to_string())
                }
                _ => None,
            }
        })
        .collect()
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// Startup preferences from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// `--ios` / `--android`.
    pub platform: Option<Platform>,
    /// `--device <id>`: bind this id without checking it exists.
    pub device: Option<String>,
    /// `--avd <name>`: boot this AVD.
    pub avd: Option<String>,
}

impl Selection {
    fn wants(&self, platform: Platform) -> bool {
        self.platform.map_or(true, |p| p == platform)
    }
}

/// Which tools were found on `PATH`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toolchain {
    pub simctl: bool,
    pub adb: bool,
}

impl Toolchain {
    pub fn any(&self) -> bool {
        self.simctl || self.adb
    }
}

pub struct Discovery<R = SystemRunner> {
    runner: R,
    config: Arc<ServerConfig>,
}

impl<R: CommandRunner> Discovery<R> {
    pub fn new(runner: R, config: Arc<ServerConfig>) -> Self {
        Self { runner, config }
    }

    // ── Probes ────────────────────────────────────────────────────────────────

    pub async fn probe(&self) -> Toolchain {
        let simctl_args = argv(["simctl", "help"]);
        let adb_args = argv(["version"]);
        let (simctl, adb) = tokio::join!(
            self.runner.run(XCRUN, &simctl_args),
            self.runner.run(ADB, &adb_args),
        );
        let tools = Toolchain {
            simctl: simctl.is_ok(),
            adb: adb.is_ok(),
        };
        info!(simctl = tools.simctl, adb = tools.adb, "device tools probed");
        tools
    }

    // ── Listing ───────────────────────────────────────────────────────────────

    async fn simctl_list(&self, filter: &str) -> Result<SimctlDeviceList, DriverError> {
        let json = self
            .runner
            .run(XCRUN, &argv(["simctl", "list", "devices", filter, "-j"]))
            .await?;
        SimctlDeviceList::parse(&json)
    }

    pub async fn booted_simulators(&self) -> Result<Vec<Device>, DriverError> {
        let list = self.simctl_list("booted").await?;
        Ok(list
            .entries()
            .filter(|(_, d)| d.state == "Booted")
            .map(|(runtime, d)| simulator_device(runtime, d))
            .collect())
    }

    /// Bootable iOS simulators (watchOS/tvOS runtimes are skipped).
    pub async fn available_simulators(&self) -> Result<Vec<Device>, DriverError> {
        let list = self.simctl_list("available").await?;
        Ok(list
            .entries()
            .filter(|(runtime, d)| runtime.contains("iOS") && d.is_available)
            .map(|(runtime, d)| simulator_device(runtime, d))
            .collect())
    }

    /// Emulators `adb` reports as `device`.  Listing failures yield nothing.
    pub async fn running_emulators(&self) -> Vec<Device> {
        let output = match self.runner.run(ADB, &argv(["devices"])).await {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "adb devices failed");
                return Vec::new();
            }
        };

        let mut devices = Vec::new();
        for serial in parse_adb_devices(&output) {
            let model = self.getprop(&serial, "ro.product.model").await;
            let sdk = self.getprop(&serial, "ro.build.version.sdk").await;
            devices.push(Device {
                name: model.clone().unwrap_or_else(|| serial.clone()),
                id: serial,
                platform: Platform::Android,
                model,
                sdk_version: sdk,
                running: true,
            });
        }
        devices
    }

    async fn getprop(&self, serial: &str, prop: &str) -> Option<String> {
        self.runner
            .run(ADB, &argv(["-s", serial, "shell", "getprop", prop]))
            .await
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub async fn available_avds(&self) -> Vec<String> {
        match self.runner.run(EMULATOR, &argv(["-list-avds"])).await {
            Ok(output) => output
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                debug!(error = %e, "emulator -list-avds failed");
                Vec::new()
            }
        }
    }

    // ── Boot ──────────────────────────────────────────────────────────────────

    /// Boots a simulator (tolerating one that is already booted) and opens
    /// Simulator.app.
    pub async fn boot_simulator(&self, udid: &str) -> Result<(), DriverError> {
        info!(udid, "booting iOS simulator");
        match self.runner.run(XCRUN, &argv(["simctl", "boot", udid])).await {
            Ok(_) => {}
            Err(DriverError::CommandFailed { detail, .. }) if detail.contains("Booted") => {
                debug!(udid, "simulator already booted");
            }
            Err(e) => return Err(e),
        }
        self.runner.run("open", &argv(["-a", "Simulator"])).await?;
        tokio::time::sleep(SIMULATOR_SETTLE).await;
        Ok(())
    }

    /// Starts `emulator -avd NAME` detached and waits for it to come online.
    pub async fn boot_avd(&self, name: &str) -> Result<Device, DriverError> {
        info!(avd = name, "booting Android emulator");
        self.runner.spawn_detached(EMULATOR, &argv(["-avd", name]))?;

        for attempt in 1..=self.config.boot_attempts {
            tokio::time::sleep(self.config.boot_poll_interval).await;
            if let Some(device) = self.running_emulators().await.into_iter().next() {
                info!(serial = %device.id, attempt, "emulator online");
                return Ok(device);
            }
            debug!(attempt, "emulator not online yet");
        }
        warn!(avd = name, attempts = self.config.boot_attempts, "emulator boot timed out");
        Err(DriverError::Timeout("emulator to boot".into()))
    }

    // ── Selection ─────────────────────────────────────────────────────────────

    /// Picks a device without prompting:
    ///
    /// 1. `--device` binds that id directly (iOS if requested, or if simctl is
    ///    present and Android was not requested),
    /// 2. `--avd` boots that AVD,
    /// 3. a running device of the requested platform, else the first running
    ///    device,
    /// 4. boots a preferred simulator, else the first AVD.
    pub async fn select(&self, tools: Toolchain, selection: &Selection) -> Result<Device, DriverError> {
        if let Some(id) = &selection.device {
            let platform = match selection.platform {
                Some(p) => p,
                None if tools.simctl => Platform::Ios,
                None => Platform::Android,
            };
            return Ok(Device {
                id: id.clone(),
                platform,
                name: id.clone(),
                model: None,
                sdk_version: None,
                running: true,
            });
        }

        if let Some(avd) = &selection.avd {
            return self.boot_avd(avd).await;
        }

        let mut running = Vec::new();
        if tools.simctl && selection.wants(Platform::Ios) {
            match self.booted_simulators().await {
                Ok(booted) => running.extend(booted),
                Err(e) => debug!(error = %e, "could not list booted simulators"),
            }
        }
        if tools.adb && selection.wants(Platform::Android) {
            running.extend(self.running_emulators().await);
        }
        if let Some(device) = running.into_iter().next() {
            return Ok(device);
        }

        if tools.simctl && selection.wants(Platform::Ios) {
            let available = self.available_simulators().await.unwrap_or_default();
            let preferred = available
                .iter()
                .find(|d| PREFERRED_SIMULATORS.iter().any(|p| d.name.contains(p)))
                .or_else(|| available.first());
            if let Some(sim) = preferred {
                self.boot_simulator(&sim.id).await?;
                return Ok(Device {
                    running: true,
                    ..sim.clone()
                });
            }
        }

        if tools.adb && selection.wants(Platform::Android) {
            if let Some(avd) = self.available_avds().await.first() {
                return self.boot_avd(avd).await;
            }
        }

        Err(DriverError::DeviceNotFound(
            "no running or bootable simulator or emulator".into(),
        ))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
