/// Status and type enums stored as `TEXT`
///
/// Each enum serializes to its snake_case database value, binds with
/// `as_str()` and loads through `#[sqlx(try_from = "String")]`.

/// A stored value that names no variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Database and wire representation
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::enums::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err($crate::models::enums::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::models::enums::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_enum! {
    /// Where an employee stands
    EmploymentStatus {
        Active => "active",
        OnLeave => "on_leave",
        Terminated => "terminated",
    }
}

impl EmploymentStatus {
    /// `is_active` flag that goes with this status
    pub const fn keeps_account_active(self) -> bool {
        !matches!(self, EmploymentStatus::Terminated)
    }
}

text_enum! {
    EmploymentType {
        FullTime => "full_time",
        PartTime => "part_time",
        Contract => "contract",
    }
}

text_enum! {
    /// Type of an employment contract or an advertised job
    ContractType {
        FullTime => "full_time",
        PartTime => "part_time",
        Contract => "contract",
        Internship => "internship",
    }
}

text_enum! {
    ContractStatus {
        Draft => "draft",
        Active => "active",
        Terminated => "terminated",
        Expired => "expired",
    }
}

impl ContractStatus {
    /// Signatures are only collected before a contract has ended
    pub const fn can_sign(self) -> bool {
        matches!(self, ContractStatus::Draft | ContractStatus::Active)
    }

    pub const fn can_terminate(self) -> bool {
        matches!(self, ContractStatus::Draft | ContractStatus::Active)
    }

    pub const fn can_delete(self) -> bool {
        matches!(self, ContractStatus::Draft)
    }
}

text_enum! {
    /// Which side signs a contract
    Signatory {
        Employee => "employee",
        Employer => "employer",
    }
}

text_enum! {
    LeaveRequestStatus {
        Pending => "pending",
        InReview => "in_review",
        Approved => "approved",
        Rejected => "rejected",
        Cancelled => "cancelled",
    }
}

impl LeaveRequestStatus {
    /// Approval and rejection are open until a decision is made
    pub const fn awaiting_decision(self) -> bool {
        matches!(self, LeaveRequestStatus::Pending | LeaveRequestStatus::InReview)
    }

    pub const fn can_cancel(self) -> bool {
        !matches!(self, LeaveRequestStatus::Rejected | LeaveRequestStatus::Cancelled)
    }

    pub const fn can_edit(self) -> bool {
        matches!(self, LeaveRequestStatus::Pending)
    }
}

text_enum! {
    RemoteType {
        Remote => "remote",
        Hybrid => "hybrid",
        OnSite => "on_site",
    }
}

impl Default for RemoteType {
    fn default() -> Self {
        RemoteType::OnSite
    }
}

text_enum! {
    JobPostingStatus {
        Draft => "draft",
        Published => "published",
        Closed => "closed",
    }
}

impl JobPostingStatus {
    /// Closed postings may be re-published
    pub const fn can_publish(self) -> bool {
        !matches!(self, JobPostingStatus::Published)
    }

    pub const fn can_close(self) -> bool {
        matches!(self, JobPostingStatus::Published)
    }
}

text_enum! {
    CandidateStatus {
        Applied => "applied",
        Screening => "screening",
        Interviewed => "interviewed",
        Offered => "offered",
        Hired => "hired",
        Rejected => "rejected",
    }
}

impl CandidateStatus {
    /// Stages a completed interview moves forward to `interviewed`
    pub const fn precedes_interview(self) -> bool {
        matches!(self, CandidateStatus::Applied | CandidateStatus::Screening)
    }
}

text_enum! {
    InterviewType {
        Phone => "phone",
        Video => "video",
        InPerson => "in_person",
    }
}

text_enum! {
    InterviewStatus {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}
