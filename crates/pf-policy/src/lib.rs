//! # pf-policy
//!
//! Compliance-driven deny policy synthesis for Policy Forge.
//!
//! Turns a handful of declarative choices (which frameworks apply, how
//! sensitive the data is, who needs emergency access) into a deterministic
//! [`PolicySet`] of deny rules for one organization, folder, or project.
//! [`compile`] runs the whole pipeline; the stages are public for callers
//! that need them one at a time.
//!
//! ## Key invariants
//!
//! - **Pure**: no I/O, no clock reads. The evaluation time is an input.
//! - **Deterministic**: identical input yields a byte-identical manifest and
//!   the same [`PolicySet::digest`].
//! - **Fail closed**: no break-glass principal while enforcement is live is a
//!   [`PolicyError::Configuration`], never a rule set with an empty exception list.
//! - **Override is explicit**: an emergency override needs a reason longer
//!   than ten characters and withholds rules without hiding that it did.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use pf_policy::{compile, CompilationInput};
//!
//! let input = CompilationInput::from_yaml_str(
//!     "scope: { tier: project, id: payments-prod }\n\
//!      enabled_frameworks: [iso27001]\n\
//!      data_classification: internal\n\
//!      exception_sources: { break_glass_group: sec@example.com }\n",
//! )
//! .unwrap()
//! .with_evaluation_time(chrono::Utc::now());
//! let outcome = compile(&input).unwrap();
//! println!("{}", outcome.policy_set.to_json_pretty().unwrap());
//! ```

pub mod applier;
pub mod assembler;
pub mod compiler;
pub mod controls;
pub mod emergency;
pub mod error;
pub mod exception;
pub mod framework;
pub mod input;
pub mod level;
pub mod overrides;
pub mod pipeline;
pub mod rule;
pub mod scope;

pub use applier::{
    apply_order, plan, ApplyPlan, ApplyReport, ChangeAction, DryRunApplier, OutcomeStatus,
    PlannedChange, PolicyApplier, RuleOutcome,
};
pub use assembler::{ManifestSummary, OverrideRecord, PolicySet, PolicySetAssembler};
pub use compiler::{FrameworkRuleCompiler, SharedControlCompiler};
pub use controls::ControlContext;
pub use emergency::{EmergencyOverride, OverrideGate, MIN_REASON_LEN};
pub use error::{PolicyError, PolicyErrorKind};
pub use exception::{
    resolve_exceptions, BreakGlassOrigin, BreakGlassResolver, ExceptionPrincipalSet,
    ExceptionResolution, ExceptionSource, ExceptionSources, RemoteBreakGlass, TemporaryExemption,
    WorkloadIdentityBinding,
};
pub use framework::{Framework, FrameworkParams, TrustCriterion};
pub use input::CompilationInput;
pub use level::{ComplianceLevel, DataClassification};
pub use overrides::{BusinessHours, SecurityControlOverrides};
pub use pipeline::{compile, compile_batch, compile_with_resolver, CompilationOutcome};
pub use rule::{DenyRule, RuleCategory, ALL_PRINCIPALS};
pub use scope::{Scope, ScopeRef, ScopeTier};
