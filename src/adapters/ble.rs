//! BLE serial link adapter.
//!
//! Implements [`LinkPort`] for the phone app's
//! text command channel.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via raw `esp_idf_svc::sys` calls.
//! - **all other targets**: in-memory simulation for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Attribute            | UUID     | Perms                 |
//! |----------------------|----------|-----------------------|
//! | Serial service       | `0xFFE0` | —                     |
//! | Serial characteristic| `0xFFE1` | Read + Write + Notify |
//! | CCCD                 | `0x2902` | Read + Write          |
//!
//! Central writes to `0xFFE1` become [`LinkEvent::Received`]; responses
//! go out as notifications on the same characteristic, one line per
//! notification, `\n` terminated.

use log::{info, warn};

use crate::app::events::{LINK_CHUNK_CAPACITY, LinkEvent};
use crate::app::ports::LinkPort;
use crate::error::LinkError;
use crate::pins;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// Largest notification payload ever sent, whatever MTU was negotiated.
pub const MAX_NOTIFY_BYTES: usize = 128;

/// ATT MTU before the central runs an exchange.
pub const DEFAULT_ATT_MTU: u16 = 23;
/// MTU offered to the central during the exchange.
pub const LOCAL_MTU: u16 = 512;
/// Opcode + attribute handle in front of every notification payload.
const ATT_NOTIFY_HEADER: usize = 3;

/// Inbound events buffered between two `poll_event` calls.
const EVENT_QUEUE_DEPTH: usize = 16;

/// Value returned to a central reading the characteristic.
const LAST_VALUE_CAPACITY: usize = MAX_NOTIFY_BYTES;

type EventQueue = heapless::Deque<LinkEvent, EVENT_QUEUE_DEPTH>;
type Frame = heapless::Vec<u8, MAX_NOTIFY_BYTES>;

/// Payload bytes one notification can carry at `mtu`.
fn notify_limit(mtu: u16) -> usize {
    usize::from(mtu)
        .saturating_sub(ATT_NOTIFY_HEADER)
        .min(MAX_NOTIFY_BYTES)
}

/// Append `line` plus the terminator, or fail if it exceeds `limit`.
fn frame_line(line: &str, limit: usize) -> Result<Frame, LinkError> {
    let mut frame = Frame::new();
    if frame.extend_from_slice(line.as_bytes()).is_err()
        || frame.push(b'\n').is_err()
        || frame.len() > limit
    {
        return Err(LinkError::MessageTooLong);
    }
    Ok(frame)
}

/// Split a central write into [`LinkEvent::Received`] chunks.
fn push_received(queue: &mut EventQueue, data: &[u8]) {
    for chunk in data.chunks(LINK_CHUNK_CAPACITY) {
        let mut buf = heapless::Vec::new();
        // Cannot fail: chunk length <= capacity.
        let _ = buf.extend_from_slice(chunk);
        if queue.push_back(LinkEvent::Received(buf)).is_err() {
            warn!("BLE: event queue full, dropping {} bytes", chunk.len());
        }
    }
}

fn push_event(queue: &mut EventQueue, event: LinkEvent) {
    if queue.push_back(event).is_err() {
        warn!("BLE: event queue full, dropping link event");
    }
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Connected,
    Failed,
}

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These statics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicU16, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
/// Connection id + 1; 0 means no central.
#[cfg(target_os = "espidf")]
static BLE_CONN: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
/// MTU agreed with the current central.
#[cfg(target_os = "espidf")]
static BLE_MTU: AtomicU16 = AtomicU16::new(DEFAULT_ATT_MTU);

// GATTS callbacks run in the Bluedroid task (not ISR), so std Mutex is safe.
#[cfg(target_os = "espidf")]
static BLE_EVENTS: std::sync::Mutex<EventQueue> = std::sync::Mutex::new(heapless::Deque::new());
#[cfg(target_os = "espidf")]
static BLE_LAST_VALUE: std::sync::Mutex<heapless::Vec<u8, LAST_VALUE_CAPACITY>> =
    std::sync::Mutex::new(heapless::Vec::new());

/// Bluetooth base UUID with the service's 16-bit alias, little-endian,
/// as the advertising payload wants it.
#[cfg(target_os = "espidf")]
static ADV_SERVICE_UUID128: [u8; 16] = [
    0xfb, 0x34, 0x9b, 0x5f, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00,
    (pins::BLE_SERVICE_UUID16 & 0xff) as u8,
    (pins::BLE_SERVICE_UUID16 >> 8) as u8,
    0x00, 0x00,
];

#[cfg(target_os = "espidf")]
const CCCD_UUID16: u16 = 0x2902;

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    // SAFETY: esp_bt_uuid_t is a plain C struct; all-zero is valid.
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn push_from_callback(event: LinkEvent) {
    if let Ok(mut q) = BLE_EVENTS.lock() {
        push_event(&mut q, event);
    }
}

#[cfg(target_os = "espidf")]
unsafe fn start_advertising() {
    use esp_idf_svc::sys::*;
    // SAFETY: plain C struct, zero is a valid default for the remaining fields.
    let mut adv_params = esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        ..unsafe { core::mem::zeroed() }
    };
    unsafe { esp_ble_gap_start_advertising(&mut adv_params) };
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
            // SAFETY: called from the Bluedroid task after the stack is up.
            unsafe { start_advertising() };
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(u32::from(gatts_if), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid16_to_esp(pins::BLE_SERVICE_UUID16),
                    inst_id: 0,
                },
                is_primary: true,
            };
            // SAFETY: Bluedroid is enabled; svc_id outlives the call.
            unsafe {
                // Service + characteristic decl + value + CCCD.
                esp_ble_gatts_create_service(gatts_if, &mut svc_id, 4);

                let mut adv_data = esp_ble_adv_data_t {
                    set_scan_rsp: false,
                    include_name: true,
                    include_txpower: false,
                    min_interval: 0x0006,
                    max_interval: 0x0010,
                    service_uuid_len: ADV_SERVICE_UUID128.len() as u16,
                    p_service_uuid: ADV_SERVICE_UUID128.as_ptr().cast_mut(),
                    flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
                    ..core::mem::zeroed()
                };
                esp_ble_gap_config_adv_data(&mut adv_data);
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            // SAFETY: Bluedroid hands a valid param for this event.
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(u32::from(svc_handle), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            let mut char_uuid = uuid16_to_esp(pins::BLE_CHAR_UUID16);
            // SAFETY: service handle comes straight from the stack.
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                esp_ble_gatts_add_char(
                    svc_handle,
                    &mut char_uuid,
                    (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                    (ESP_GATT_CHAR_PROP_BIT_READ
                        | ESP_GATT_CHAR_PROP_BIT_WRITE
                        | ESP_GATT_CHAR_PROP_BIT_NOTIFY) as esp_gatt_char_prop_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            // SAFETY: valid param for this event.
            let handle = unsafe { (*param).add_char.attr_handle };
            BLE_CHAR_HANDLE.store(u32::from(handle), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: serial char (handle={})", handle);
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            let mut cccd_uuid = uuid16_to_esp(CCCD_UUID16);
            // SAFETY: service is running; descriptor attaches to the char just added.
            unsafe {
                esp_ble_gatts_add_char_descr(
                    svc_handle,
                    &mut cccd_uuid,
                    (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            // SAFETY: valid param for this event.
            let conn_id = unsafe { (*param).connect.conn_id };
            BLE_CONN.store(u32::from(conn_id) + 1, AtomicOrdering::Relaxed);
            BLE_MTU.store(DEFAULT_ATT_MTU, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client connected (conn_id={})", conn_id);
            push_from_callback(LinkEvent::Connected);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_CONN.store(0, AtomicOrdering::Relaxed);
            BLE_MTU.store(DEFAULT_ATT_MTU, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client disconnected");
            push_from_callback(LinkEvent::Disconnected);
            // SAFETY: stack is up; restart advertising so the phone can reconnect.
            unsafe { start_advertising() };
        }
        esp_gatts_cb_event_t_ESP_GATTS_MTU_EVT => {
            // SAFETY: valid param for this event.
            let mtu = unsafe { (*param).mtu.mtu };
            BLE_MTU.store(mtu, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: MTU={}", mtu);
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            // SAFETY: valid param for this event; value/len describe the written bytes.
            let p = unsafe { &(*param).write };
            let data = unsafe { core::slice::from_raw_parts(p.value, usize::from(p.len)) };

            if u32::from(p.handle) == BLE_CHAR_HANDLE.load(AtomicOrdering::Relaxed) {
                if let Ok(mut q) = BLE_EVENTS.lock() {
                    push_received(&mut q, data);
                }
            }
            if p.need_rsp {
                // SAFETY: responds to the transaction Bluedroid just delivered.
                unsafe {
                    esp_ble_gatts_send_response(
                        gatts_if,
                        p.conn_id,
                        p.trans_id,
                        esp_gatt_status_t_ESP_GATT_OK,
                        core::ptr::null_mut(),
                    );
                }
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_READ_EVT => {
            // SAFETY: valid param for this event.
            let p = unsafe { &(*param).read };
            // SAFETY: plain C union, zero is valid.
            let mut rsp: esp_gatt_rsp_t = unsafe { core::mem::zeroed() };
            unsafe {
                rsp.attr_value.handle = p.handle;
                if let Ok(value) = BLE_LAST_VALUE.lock() {
                    rsp.attr_value.len = value.len() as u16;
                    rsp.attr_value.value[..value.len()].copy_from_slice(&value);
                }
                esp_ble_gatts_send_response(
                    gatts_if,
                    p.conn_id,
                    p.trans_id,
                    esp_gatt_status_t_ESP_GATT_OK,
                    &mut rsp,
                );
            }
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE link
// ───────────────────────────────────────────────────────────────

pub struct BleLink {
    state: BleState,
    device_name: heapless::String<24>,
    #[cfg(not(target_os = "espidf"))]
    sim_events: EventQueue,
    /// Simulation: every frame sent, terminator included.
    #[cfg(not(target_os = "espidf"))]
    sim_sent: Vec<Frame>,
    #[cfg(not(target_os = "espidf"))]
    sim_mtu: u16,
}

impl BleLink {
    pub fn new(device_name: &str) -> Self {
        let mut name = heapless::String::new();
        for c in device_name.chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        Self {
            state: BleState::Idle,
            device_name: name,
            #[cfg(not(target_os = "espidf"))]
            sim_events: EventQueue::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_sent: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_mtu: DEFAULT_ATT_MTU,
        }
    }

    /// Link with the board's advertised name.
    pub fn with_default_name() -> Self {
        Self::new(pins::DEVICE_NAME)
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// ATT MTU of the current connection.
    #[cfg(target_os = "espidf")]
    pub fn mtu(&self) -> u16 {
        BLE_MTU.load(AtomicOrdering::Relaxed)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn mtu(&self) -> u16 {
        self.sim_mtu
    }

    /// Bring up the stack and start advertising.
    pub fn start(&mut self) -> Result<(), LinkError> {
        info!("BLE: starting advertising as '{}'", self.device_name);
        match self.platform_start() {
            Ok(()) => {
                self.state = BleState::Advertising;
                Ok(())
            }
            Err(e) => {
                self.state = BleState::Failed;
                Err(e)
            }
        }
    }

    fn on_event(&mut self, event: &LinkEvent) {
        match event {
            LinkEvent::Connected => {
                info!("BLE: central connected");
                self.state = BleState::Connected;
            }
            LinkEvent::Disconnected => {
                info!("BLE: central disconnected, advertising again");
                if self.state != BleState::Idle {
                    self.state = BleState::Advertising;
                }
            }
            LinkEvent::Received(_) => {}
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        use esp_idf_svc::sys::*;

        fn check(ret: esp_err_t, what: &str) -> Result<(), LinkError> {
            if ret != ESP_OK as i32 {
                log::error!("BLE: {} failed ({})", what, ret);
                return Err(LinkError::StackInitFailed(ret));
            }
            Ok(())
        }

        // SAFETY: called once from main before the event loop; Bluedroid
        // owns every pointer only for the duration of each call.
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            check(esp_bt_controller_init(&mut bt_cfg), "bt_controller_init")?;
            check(esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE), "bt_controller_enable")?;
            check(esp_bluedroid_init(), "bluedroid_init")?;
            check(esp_bluedroid_enable(), "bluedroid_enable")?;

            check(esp_ble_gap_register_callback(Some(ble_gap_event_handler)), "gap_register")?;
            check(esp_ble_gatts_register_callback(Some(ble_gatts_event_handler)), "gatts_register")?;

            let mut name = heapless::Vec::<u8, 25>::new();
            let _ = name.extend_from_slice(self.device_name.as_bytes());
            let _ = name.push(0);
            check(esp_ble_gap_set_device_name(name.as_ptr().cast()), "set_device_name")?;

            // Advertising starts from the GAP callback once the adv data is set.
            check(esp_ble_gatts_app_register(0), "gatts_app_register")?;
            check(esp_ble_gatt_set_local_mtu(LOCAL_MTU), "set_local_mtu")?;
        }

        info!("BLE(espidf): Bluedroid stack initialized as '{}'", self.device_name);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        info!(
            "BLE(sim): advertising '{}' (service {:04X}, char {:04X})",
            self.device_name,
            pins::BLE_SERVICE_UUID16,
            pins::BLE_CHAR_UUID16
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_pop_event(&mut self) -> Option<LinkEvent> {
        BLE_EVENTS.lock().ok().and_then(|mut q| q.pop_front())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_pop_event(&mut self) -> Option<LinkEvent> {
        self.sim_events.pop_front()
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self, frame: &Frame) -> Result<(), LinkError> {
        use esp_idf_svc::sys::*;

        let conn = BLE_CONN.load(AtomicOrdering::Relaxed);
        let handle = BLE_CHAR_HANDLE.load(AtomicOrdering::Relaxed);
        if conn == 0 || handle == 0 {
            return Err(LinkError::NotConnected);
        }
        if let Ok(mut last) = BLE_LAST_VALUE.lock() {
            last.clear();
            let _ = last.extend_from_slice(frame);
        }
        // SAFETY: frame outlives the call; Bluedroid copies the payload.
        let ret = unsafe {
            esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as esp_gatt_if_t,
                (conn - 1) as u16,
                handle as u16,
                frame.len() as u16,
                frame.as_ptr().cast_mut(),
                false,
            )
        };
        if ret != ESP_OK as i32 {
            return Err(LinkError::NotifyFailed(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self, frame: &Frame) -> Result<(), LinkError> {
        self.sim_sent.push(frame.clone());
        Ok(())
    }
}

// ── Simulation hooks ──────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl BleLink {
    /// Pretend a central connected and took the full offered MTU.
    pub fn sim_connect(&mut self) {
        self.sim_mtu = LOCAL_MTU;
        push_event(&mut self.sim_events, LinkEvent::Connected);
    }

    /// Pretend the MTU exchange settled on `mtu`.
    pub fn sim_set_mtu(&mut self, mtu: u16) {
        self.sim_mtu = mtu;
    }

    /// Pretend the central wrote `data` to the serial characteristic.
    pub fn sim_write(&mut self, data: &[u8]) {
        push_received(&mut self.sim_events, data);
    }

    pub fn sim_disconnect(&mut self) {
        self.sim_mtu = DEFAULT_ATT_MTU;
        push_event(&mut self.sim_events, LinkEvent::Disconnected);
    }

    /// Every notification sent so far, as text.
    pub fn sent(&self) -> Vec<&str> {
        self.sim_sent
            .iter()
            .filter_map(|f| core::str::from_utf8(f).ok())
            .collect()
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort implementation
// ───────────────────────────────────────────────────────────────

impl LinkPort for BleLink {
    fn poll_event(&mut self) -> Option<LinkEvent> {
        let event = self.platform_pop_event()?;
        self.on_event(&event);
        Some(event)
    }

    fn send(&mut self, line: &str) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let frame = frame_line(line, notify_limit(self.mtu()))?;
        self.platform_notify(&frame)
    }

    fn is_connected(&self) -> bool {
        self.state == BleState::Connected
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    fn started() -> BleLink {
        let mut link = BleLink::with_default_name();
        link.start().unwrap();
        link
    }

    #[test]
    fn start_advertises_under_device_name() {
        let link = started();
        assert_eq!(link.state(), BleState::Advertising);
        assert_eq!(link.device_name(), "SMART_MassageMask");
        assert!(!link.is_connected());
    }

    #[test]
    fn connect_disconnect_cycle() {
        let mut link = started();
        link.sim_connect();
        assert_eq!(link.poll_event(), Some(LinkEvent::Connected));
        assert_eq!(link.state(), BleState::Connected);
        link.sim_disconnect();
        assert_eq!(link.poll_event(), Some(LinkEvent::Disconnected));
        assert_eq!(link.state(), BleState::Advertising);
        assert_eq!(link.poll_event(), None);
    }

    #[test]
    fn send_requires_central() {
        let mut link = started();
        assert_eq!(link.send("READY"), Err(LinkError::NotConnected));
        link.sim_connect();
        link.poll_event();
        link.send("READY").unwrap();
        assert_eq!(link.sent(), ["READY\n"]);
    }

    #[test]
    fn oversized_line_is_rejected() {
        let mut link = started();
        link.sim_connect();
        link.poll_event();
        let long = "x".repeat(MAX_NOTIFY_BYTES);
        assert_eq!(link.send(&long), Err(LinkError::MessageTooLong));
        assert!(link.sent().is_empty());
    }

    #[test]
    fn frames_must_fit_the_negotiated_mtu() {
        let mut link = started();
        link.sim_connect();
        link.poll_event();
        link.sim_set_mtu(DEFAULT_ATT_MTU);

        // 22 bytes + terminator > 20-byte payload.
        assert_eq!(link.send("OK: Mode=2 Intensity=3"), Err(LinkError::MessageTooLong));
        // 19 bytes + terminator fits exactly.
        link.send("TIMER_COMPLETE12345").unwrap();

        link.sim_set_mtu(LOCAL_MTU);
        link.send("OK: Mode=2 Intensity=3").unwrap();
        assert_eq!(link.sent(), ["TIMER_COMPLETE12345\n", "OK: Mode=2 Intensity=3\n"]);
    }

    #[test]
    fn mtu_falls_back_to_default_on_disconnect() {
        let mut link = started();
        assert_eq!(link.mtu(), DEFAULT_ATT_MTU);
        link.sim_connect();
        assert_eq!(link.mtu(), LOCAL_MTU);
        link.sim_disconnect();
        assert_eq!(link.mtu(), DEFAULT_ATT_MTU);
    }

    #[test]
    fn notify_limit_is_capped() {
        assert_eq!(notify_limit(DEFAULT_ATT_MTU), 20);
        assert_eq!(notify_limit(LOCAL_MTU), MAX_NOTIFY_BYTES);
        assert_eq!(notify_limit(0), 0);
    }

    #[test]
    fn large_write_is_chunked() {
        let mut link = started();
        link.sim_write(&[b'a'; LINK_CHUNK_CAPACITY + 10]);
        match link.poll_event() {
            Some(LinkEvent::Received(chunk)) => assert_eq!(chunk.len(), LINK_CHUNK_CAPACITY),
            other => panic!("unexpected {other:?}"),
        }
        match link.poll_event() {
            Some(LinkEvent::Received(chunk)) => assert_eq!(chunk.len(), 10),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn long_names_are_truncated() {
        let link = BleLink::new("a-very-long-device-name-that-overflows");
        assert_eq!(link.device_name().len(), 24);
    }
}
