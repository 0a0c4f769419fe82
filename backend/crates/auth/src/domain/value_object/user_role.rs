use serde::{Deserialize, Serialize};
use std::fmt;

/// Organizational role. Membership checks only; no policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    HrManager,
    FinanceOfficer,
    DepartmentHead,
    #[default]
    Employee,
    Auditor,
}

impl UserRole {
    pub const ALL: [UserRole; 6] = [
        UserRole::Admin,
        UserRole::HrManager,
        UserRole::FinanceOfficer,
        UserRole::DepartmentHead,
        UserRole::Employee,
        UserRole::Auditor,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Admin => "admin",
            HrManager => "hr_manager",
            FinanceOfficer => "finance_officer",
            DepartmentHead => "department_head",
            Employee => "employee",
            Auditor => "auditor",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.code() == code)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
