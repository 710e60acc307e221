//! Exception causes encoded in the low half of a result code.
//!
//! The order is fixed by the trace producer and addressed by index.

use std::fmt;

use serde::Serialize;

/// Exception cause recorded for a trapping instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionCause {
    MisalignedFetch,
    FetchAccess,
    IllegalInstruction,
    Breakpoint,
    MisalignedLoad,
    LoadAccess,
    MisalignedStore,
    StoreAccess,
    UserEcall,
    SupervisorEcall,
    VirtualSupervisorEcall,
    MachineEcall,
    FetchPageFault,
    LoadPageFault,
    StorePageFault,
    DoubleTrap,
    SoftwareCheckFault,
    HardwareErrorFault,
    FetchGuestPageFault,
    LoadGuestPageFault,
    VirtualInstruction,
    StoreGuestPageFault,
}

impl ExceptionCause {
    /// All causes in index order.
    pub const ALL: [Self; 22] = [
        Self::MisalignedFetch,
        Self::FetchAccess,
        Self::IllegalInstruction,
        Self::Breakpoint,
        Self::MisalignedLoad,
        Self::LoadAccess,
        Self::MisalignedStore,
        Self::StoreAccess,
        Self::UserEcall,
        Self::SupervisorEcall,
        Self::VirtualSupervisorEcall,
        Self::MachineEcall,
        Self::FetchPageFault,
        Self::LoadPageFault,
        Self::StorePageFault,
        Self::DoubleTrap,
        Self::SoftwareCheckFault,
        Self::HardwareErrorFault,
        Self::FetchGuestPageFault,
        Self::LoadGuestPageFault,
        Self::VirtualInstruction,
        Self::StoreGuestPageFault,
    ];

    /// Look up a cause by its index in the fixed list.
    #[must_use]
    pub fn from_index(index: u16) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Index of this cause in the fixed list.
    #[must_use]
    pub const fn index(self) -> u16 {
        // ALL is ordered by discriminant.
        self as u16
    }

    /// Upper-case display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MisalignedFetch => "MISALIGNED_FETCH",
            Self::FetchAccess => "FETCH_ACCESS",
            Self::IllegalInstruction => "ILLEGAL_INSTRUCTION",
            Self::Breakpoint => "BREAKPOINT",
            Self::MisalignedLoad => "MISALIGNED_LOAD",
            Self::LoadAccess => "LOAD_ACCESS",
            Self::MisalignedStore => "MISALIGNED_STORE",
            Self::StoreAccess => "STORE_ACCESS",
            Self::UserEcall => "USER_ECALL",
            Self::SupervisorEcall => "SUPERVISOR_ECALL",
            Self::VirtualSupervisorEcall => "VIRTUAL_SUPERVISOR_ECALL",
            Self::MachineEcall => "MACHINE_ECALL",
            Self::FetchPageFault => "FETCH_PAGE_FAULT",
            Self::LoadPageFault => "LOAD_PAGE_FAULT",
            Self::StorePageFault => "STORE_PAGE_FAULT",
            Self::DoubleTrap => "DOUBLE_TRAP",
            Self::SoftwareCheckFault => "SOFTWARE_CHECK_FAULT",
            Self::HardwareErrorFault => "HARDWARE_ERROR_FAULT",
            Self::FetchGuestPageFault => "FETCH_GUEST_PAGE_FAULT",
            Self::LoadGuestPageFault => "LOAD_GUEST_PAGE_FAULT",
            Self::VirtualInstruction => "VIRTUAL_INSTRUCTION",
            Self::StoreGuestPageFault => "STORE_GUEST_PAGE_FAULT",
        }
    }
}

impl fmt::Display for ExceptionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
