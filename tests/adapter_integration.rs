// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the adapter, driven by an in-memory vendor client.

use std::sync::Arc;
use std::time::Duration;

use aztech_adapter::vendor::{
    EnergySnapshot, LightClient, LightState, LightStateChange, SysInfo, VendorClient,
};
use aztech_adapter::{
    Adapter, AdapterConfig, Capability, DeviceEvent, DeviceId, PollConfig, PropertyValue,
    VendorError,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;

// ============================================================================
// Fake vendor client
// ============================================================================

/// A device whose state the test edits directly.
#[derive(Default)]
struct FakeDevice {
    status: Mutex<SysInfo>,
    energy: Mutex<Option<EnergySnapshot>>,
    light: Mutex<LightState>,
    offline: Mutex<bool>,
    hang: Mutex<bool>,
    changes: Mutex<Vec<LightStateChange>>,
}

impl FakeDevice {
    fn new(status: SysInfo) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(status),
            ..Self::default()
        })
    }

    fn with_energy(self: Arc<Self>, energy: EnergySnapshot) -> Arc<Self> {
        *self.energy.lock() = Some(energy);
        self
    }

    fn with_light(self: Arc<Self>, light: LightState) -> Arc<Self> {
        *self.light.lock() = light;
        self
    }

    fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }

    fn reachable(&self) -> Result<(), VendorError> {
        if *self.offline.lock() {
            Err(VendorError::Communication("host unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    async fn maybe_hang(&self) {
        let hang = *self.hang.lock();
        if hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

impl VendorClient for FakeDevice {
    async fn sys_info(&self) -> Result<SysInfo, VendorError> {
        self.maybe_hang().await;
        self.reachable()?;
        Ok(self.status.lock().clone())
    }

    async fn energy(&self) -> Result<EnergySnapshot, VendorError> {
        self.reachable()?;
        self.energy
            .lock()
            .clone()
            .ok_or_else(|| VendorError::Rejected("no energy meter".to_string()))
    }

    async fn set_relay_state(&self, outlet: Option<usize>, on: bool) -> Result<(), VendorError> {
        self.reachable()?;
        let mut status = self.status.lock();
        match outlet {
            Some(index) => status.children[index].state = Some(u8::from(on)),
            None => status.relay_state = Some(u8::from(on)),
        }
        Ok(())
    }

    async fn set_led_off(&self, off: bool) -> Result<(), VendorError> {
        self.reachable()?;
        self.status.lock().led_off = Some(u8::from(off));
        Ok(())
    }

    async fn set_brightness(&self, level: u8) -> Result<(), VendorError> {
        self.reachable()?;
        self.status.lock().brightness = Some(level);
        Ok(())
    }
}

impl LightClient for FakeDevice {
    async fn light_state(&self) -> Result<LightState, VendorError> {
        self.reachable()?;
        Ok(self.light.lock().clone())
    }

    fn color_temperature_range(&self) -> (u16, u16) {
        (2500, 9000)
    }

    async fn transition_light_state(
        &self,
        change: &LightStateChange,
    ) -> Result<LightState, VendorError> {
        self.reachable()?;
        self.changes.lock().push(change.clone());
        let mut light = self.light.lock();
        light.apply(change);
        Ok(light.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const INTERVAL: Duration = Duration::from_secs(5);

fn adapter() -> Adapter<FakeDevice> {
    Adapter::new(
        AdapterConfig::default().with_poll(
            PollConfig::new()
                .with_interval(INTERVAL)
                .with_fetch_timeout(Duration::from_secs(2)),
        ),
    )
}

fn kettle() -> SysInfo {
    SysInfo::from_json(
        r#"{
            "model": "HS110(EU)",
            "alias": "Kettle",
            "deviceId": "8006F2",
            "mic_type": "IOT.SMARTPLUGSWITCH",
            "feature": "TIM:ENE",
            "relay_state": 0,
            "led_off": 0
        }"#,
    )
    .unwrap()
}

fn color_bulb() -> SysInfo {
    SysInfo::from_json(
        r#"{
            "model": "LB130(EU)",
            "alias": "",
            "deviceId": "80120C",
            "type": "IOT.SMARTBULB",
            "is_color": 1,
            "is_variable_color_temp": 1,
            "is_dimmable": 1
        }"#,
    )
    .unwrap()
}

fn off_bulb_light() -> LightState {
    LightState::from_json(
        r#"{
            "on_off": 0,
            "hue": 0, "saturation": 0, "brightness": 0, "color_temp": 0,
            "dft_on_state": {"hue": 120, "saturation": 50, "brightness": 80, "color_temp": 0}
        }"#,
    )
    .unwrap()
}

/// Collects every event currently buffered.
fn drain(rx: &mut broadcast::Receiver<DeviceEvent>) -> Vec<DeviceEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ============================================================================
// Plugs
// ============================================================================

mod plugs {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn metered_plug_is_described_for_the_gateway() {
        let adapter = adapter();
        let device = FakeDevice::new(kettle()).with_energy(EnergySnapshot {
            power_mw: Some(2000.0),
            voltage_mv: Some(231_500.0),
            ..EnergySnapshot::default()
        });

        let ids = adapter.add_device(device).await.unwrap();
        let description = adapter.description(&ids[0]).await.unwrap();
        let json = serde_json::to_value(&description).unwrap();

        assert_eq!(json["id"], "aztech-8006F2");
        assert_eq!(json["title"], "Kettle");
        assert_eq!(
            json["@type"],
            serde_json::json!(["OnOffSwitch", "SmartPlug", "EnergyMonitor"])
        );
        assert_eq!(
            json["properties"]["instantaneousPower"],
            serde_json::json!({
                "@type": "InstantaneousPowerProperty",
                "title": "Power",
                "type": "number",
                "unit": "watt",
                "readOnly": true
            })
        );
        assert!(json["properties"].get("current").is_none());

        let plug = adapter.device(&ids[0]).await.unwrap();
        assert_eq!(
            plug.property_value("instantaneousPower"),
            Some(PropertyValue::Number(2.0))
        );
        assert_eq!(
            plug.property_value("voltage"),
            Some(PropertyValue::Number(231.5))
        );

        adapter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn polling_reports_changed_values() {
        let adapter = adapter();
        let device = FakeDevice::new(kettle()).with_energy(EnergySnapshot {
            power: Some(0.0),
            ..EnergySnapshot::default()
        });
        let ids = adapter.add_device(Arc::clone(&device)).await.unwrap();
        let mut rx = adapter.subscribe();

        device.status.lock().relay_state = Some(1);
        *device.energy.lock() = Some(EnergySnapshot {
            power: Some(1850.0),
            ..EnergySnapshot::default()
        });
        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                DeviceEvent::property_changed(
                    ids[0].clone(),
                    "instantaneousPower",
                    PropertyValue::Number(1850.0)
                ),
                DeviceEvent::property_changed(ids[0].clone(), "on", PropertyValue::Boolean(true)),
            ]
        );

        // Nothing changed: nothing published.
        tokio::time::sleep(INTERVAL).await;
        assert!(drain(&mut rx).is_empty());

        adapter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn strip_outlets_are_independent_devices() {
        let adapter = adapter();
        let status = SysInfo::from_json(
            r#"{
                "model": "HS300(US)",
                "alias": "Desk",
                "deviceId": "80067B",
                "feature": "TIM",
                "led_off": 0,
                "children": [
                    {"id": "00", "alias": "Monitor", "state": 1},
                    {"id": "01", "alias": "", "state": 0},
                    {"id": "02", "alias": "Speakers", "state": 1}
                ]
            }"#,
        )
        .unwrap();
        let device = FakeDevice::new(status);

        let ids = adapter.add_device(Arc::clone(&device)).await.unwrap();
        assert_eq!(ids.len(), 3);

        let unnamed = adapter.device(&ids[1]).await.unwrap();
        assert_eq!(unnamed.info().name(), "HS300(US)");

        adapter
            .set_property(&ids[1], "on", PropertyValue::Boolean(true))
            .await
            .unwrap();
        assert_eq!(device.status.lock().children[1].state, Some(1));
        assert_eq!(unnamed.property_value("on"), Some(PropertyValue::Boolean(true)));

        adapter.remove_device(&ids[2]).await.unwrap();
        assert_eq!(adapter.device_ids().await, ids[..2].to_vec());

        adapter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn light_switch_hides_plug_semantics() {
        let adapter = adapter();
        let mut status = kettle();
        status.feature = Some("TIM".to_string());
        status.dev_name = Some("Smart Wi-Fi Light Switch".to_string());
        status.brightness = Some(35);

        let ids = adapter.add_plug(FakeDevice::new(status)).await.unwrap();
        let switch = adapter.device(&ids[0]).await.unwrap();

        assert_eq!(
            switch.info().capabilities(),
            &[Capability::OnOffSwitch, Capability::MultiLevelSwitch]
        );
        assert_eq!(switch.property_value("level"), Some(PropertyValue::Integer(35)));

        adapter.shutdown().await;
    }
}

// ============================================================================
// Bulbs
// ============================================================================

mod bulbs {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn off_bulb_exposes_resume_values() {
        let adapter = adapter();
        let device = FakeDevice::new(color_bulb()).with_light(off_bulb_light());

        let ids = adapter.add_device(device).await.unwrap();
        let bulb = adapter.device(&ids[0]).await.unwrap();

        assert!(bulb.as_bulb().is_some());
        assert_eq!(bulb.info().name(), "LB130(EU)");
        assert_eq!(bulb.property_value("colorMode"), Some(PropertyValue::from("color")));
        assert_eq!(bulb.property_value("level"), Some(PropertyValue::Integer(80)));
        assert_eq!(bulb.property_value("color"), Some(PropertyValue::from("#66cc66")));
        assert_eq!(bulb.property_value("on"), Some(PropertyValue::Boolean(false)));
        assert!(!bulb.info().capabilities().contains(&Capability::EnergyMonitor));

        adapter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn color_write_becomes_an_hsv_transition() {
        let adapter = adapter();
        let device = FakeDevice::new(color_bulb()).with_light(off_bulb_light());
        let ids = adapter.add_device(Arc::clone(&device)).await.unwrap();

        adapter
            .set_property(&ids[0], "color", PropertyValue::from("#0000FF"))
            .await
            .unwrap();

        assert_eq!(
            *device.changes.lock(),
            vec![LightStateChange {
                hue: Some(240),
                saturation: Some(100),
                brightness: Some(100),
                color_temp: Some(0),
                ..LightStateChange::default()
            }]
        );
        let bulb = adapter.device(&ids[0]).await.unwrap();
        assert_eq!(bulb.property_value("color"), Some(PropertyValue::from("#0000ff")));
        assert_eq!(bulb.property_value("level"), Some(PropertyValue::Integer(100)));
        assert_eq!(bulb.property_value("on"), Some(PropertyValue::Boolean(false)));

        let rejected = adapter
            .set_property(&ids[0], "colorTemperature", PropertyValue::Integer(12_000))
            .await;
        assert!(rejected.is_err());
        assert_eq!(device.changes.lock().len(), 1);

        adapter.shutdown().await;
    }
}

// ============================================================================
// Connectivity
// ============================================================================

mod connectivity {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn outage_is_reported_once_and_recovers() {
        let adapter = adapter();
        let mut status = kettle();
        status.feature = Some("TIM".to_string());
        let device = FakeDevice::new(status);
        let ids = adapter.add_device(Arc::clone(&device)).await.unwrap();
        let mut rx = adapter.subscribe();

        device.set_offline(true);
        tokio::time::sleep(INTERVAL * 3 + Duration::from_secs(1)).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            DeviceEvent::ConnectionChanged { connected: false, error: Some(_), .. }
        ));
        let plug = adapter.device(&ids[0]).await.unwrap();
        assert!(!plug.info().is_connected());
        assert_eq!(plug.property_value("on"), Some(PropertyValue::Boolean(false)));

        device.set_offline(false);
        device.status.lock().relay_state = Some(1);
        tokio::time::sleep(INTERVAL).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                DeviceEvent::connected(ids[0].clone()),
                DeviceEvent::property_changed(ids[0].clone(), "on", PropertyValue::Boolean(true)),
            ]
        );

        adapter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn hung_vendor_call_times_out() {
        let adapter = adapter();
        let mut status = kettle();
        status.feature = Some("TIM".to_string());
        let device = FakeDevice::new(status);
        let ids = adapter.add_device(Arc::clone(&device)).await.unwrap();
        let mut rx = adapter.subscribe();

        *device.hang.lock() = true;
        tokio::time::sleep(INTERVAL + Duration::from_secs(3)).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            DeviceEvent::ConnectionChanged {
                device_id,
                connected,
                error,
            } => {
                assert_eq!(device_id, &ids[0]);
                assert!(!connected);
                assert!(error.as_deref().unwrap().contains("timed out"));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        adapter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_device_is_reported() {
        let adapter = adapter();
        let missing = DeviceId::new("aztech-000000");

        assert!(adapter.remove_device(&missing).await.is_err());
        assert!(adapter.description(&missing).await.is_none());
    }
}
