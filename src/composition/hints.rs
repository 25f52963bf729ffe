/// Stable codes for composition hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum HintCode {
    #[strum(to_string = "OVERRIDDEN_FIELD_CAN_BE_REMOVED")]
    OverriddenFieldCanBeRemoved,
    #[strum(to_string = "OVERRIDDEN_FIELD_CAN_BE_MADE_EXTERNAL")]
    OverriddenFieldCanBeMadeExternal,
}

/// A non-fatal observation surfaced alongside a successful composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionHint {
    pub code: HintCode,
    pub message: String,
}

impl CompositionHint {
    pub fn code_string(&self) -> String {
        self.code.to_string()
    }
}
