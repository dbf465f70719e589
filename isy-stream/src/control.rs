//! Classification of control-plane (`_`-prefixed) events
//!
//! The hub's control categories are a closed vendor enumeration. Each known
//! category is one row in [`CONTROL_TABLE`]; anything not in the table is
//! reported as unknown so new firmware features stand out in the logs.

/// How a control-plane category is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCategory {
    /// `_0`: keepalive that must be answered
    Heartbeat,
    /// `_1`: trigger events (program status, info strings, ...)
    Trigger,
    /// `_3`: node added, removed, renamed, errored
    NodeChanged,
    /// Known category that is only shown in the host's event viewer
    EventViewer(&'static str),
    /// Known category that is dropped without a trace
    Silent,
}

/// Every control-plane category the hub is known to send
pub const CONTROL_TABLE: &[(&str, ControlCategory)] = &[
    ("_0", ControlCategory::Heartbeat),
    ("_1", ControlCategory::Trigger),
    ("_2", ControlCategory::EventViewer("Driver specific")),
    ("_3", ControlCategory::NodeChanged),
    ("_4", ControlCategory::EventViewer("system config")),
    ("_5", ControlCategory::EventViewer("system status")),
    ("_6", ControlCategory::EventViewer("internet access")),
    ("_7", ControlCategory::EventViewer("system progress")),
    ("_8", ControlCategory::EventViewer("security event")),
    ("_9", ControlCategory::EventViewer("system alert")),
    ("_10", ControlCategory::EventViewer("OpenADR event")),
    ("_11", ControlCategory::EventViewer("weather event")),
    ("_12", ControlCategory::EventViewer("AMI Meter")),
    ("_13", ControlCategory::EventViewer("Electricity Monitor")),
    ("_14", ControlCategory::EventViewer("UPB Event")),
    ("_15", ControlCategory::EventViewer("UPB Event")),
    ("_16", ControlCategory::EventViewer("UPB Event")),
    ("_17", ControlCategory::EventViewer("Gas Meter")),
    ("_18", ControlCategory::EventViewer("Zigbee Action")),
    ("_19", ControlCategory::EventViewer("ELK event")),
    ("_20", ControlCategory::EventViewer("Device Linker")),
    ("_21", ControlCategory::EventViewer("Zwave event")),
    ("_22", ControlCategory::EventViewer("Billing Event")),
    ("_23", ControlCategory::Silent),
];

/// Look up a control-plane category, `None` if the control is unknown
pub fn classify(control: &str) -> Option<ControlCategory> {
    CONTROL_TABLE
        .iter()
        .find(|(code, _)| *code == control)
        .map(|(_, category)| *category)
}

/// Actions of the `_1` trigger category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// `0`: a program started or finished a branch
    ProgramStatus,
    /// `3`: free-text information for the event viewer
    Info,
    /// `4` IR learn mode, `6`/`7` variable changes, `8` current program key
    Ignored,
}

impl TriggerAction {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "0" => Some(TriggerAction::ProgramStatus),
            "3" => Some(TriggerAction::Info),
            "4" | "6" | "7" | "8" => Some(TriggerAction::Ignored),
            _ => None,
        }
    }
}

/// Actions of the `_3` node-changed category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    /// `NE`: communication error
    CommError,
    /// `CE`: communication error cleared
    CommResumed,
    /// `NR`: node removed
    Removed,
    /// `ND`: node added
    Added,
    /// `NN`: node renamed
    Renamed,
    /// Scene, folder, link and network bookkeeping
    Ignored,
}

const IGNORED_NODE_ACTIONS: &[&str] = &[
    "GN", "GR", "GD", "MV", "CL", "RG", "EN", "PC", "PI", "DI", "DP", "RV", "FN", "FR", "FD",
    "SN", "SC", "WR", "WH", "WD",
];

impl NodeAction {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "NE" => Some(NodeAction::CommError),
            "CE" => Some(NodeAction::CommResumed),
            "NR" => Some(NodeAction::Removed),
            "ND" => Some(NodeAction::Added),
            "NN" => Some(NodeAction::Renamed),
            other if IGNORED_NODE_ACTIONS.contains(&other) => Some(NodeAction::Ignored),
            _ => None,
        }
    }
}

/// Event viewer line for a forwarded category
pub fn event_viewer_message(label: &str, control: &str, node: &str, action: &str, event_info: &str) -> String {
    format!("IGNORED {} {} {} {} {}", label, control, node, action, event_info)
}
