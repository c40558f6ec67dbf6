// compiler.rs — Framework and shared rule compilers.
//
// Both compilers are pure table walks: for each ControlSpec whose activation
// predicate holds, emit one DenyRule named `<category>-<control-id>` with the
// shared exception list attached. Inactive controls emit nothing.

use std::collections::BTreeSet;

use crate::controls::{self, ControlContext, ControlSpec};
use crate::exception::ExceptionPrincipalSet;
use crate::framework::Framework;
use crate::rule::{DenyRule, RuleCategory};

fn compile_table(
    category: RuleCategory,
    table: &[ControlSpec],
    ctx: &ControlContext<'_>,
    exceptions: &ExceptionPrincipalSet,
) -> Vec<DenyRule> {
    table
        .iter()
        .filter_map(|spec| spec.instantiate(category, ctx, exceptions))
        .collect()
}

/// Compiles one framework's control table into deny rules.
pub struct FrameworkRuleCompiler;

impl FrameworkRuleCompiler {
    /// Rules for `framework` at the context's level, classification, and params.
    pub fn compile(
        framework: Framework,
        ctx: &ControlContext<'_>,
        exceptions: &ExceptionPrincipalSet,
    ) -> Vec<DenyRule> {
        let rules = compile_table(
            framework.into(),
            controls::table(framework),
            ctx,
            exceptions,
        );
        tracing::debug!(%framework, level = %ctx.level, rules = rules.len(), "framework compiled");
        rules
    }

    /// Rules for every enabled framework, in canonical framework order.
    pub fn compile_all(
        enabled: &BTreeSet<Framework>,
        ctx: &ControlContext<'_>,
        exceptions: &ExceptionPrincipalSet,
    ) -> Vec<DenyRule> {
        enabled
            .iter()
            .flat_map(|framework| Self::compile(*framework, ctx, exceptions))
            .collect()
    }
}

/// Compiles the cross-framework controls.
pub struct SharedControlCompiler;

impl SharedControlCompiler {
    /// Shared rules, or none when no framework is enabled.
    pub fn compile(
        enabled: &BTreeSet<Framework>,
        ctx: &ControlContext<'_>,
        exceptions: &ExceptionPrincipalSet,
    ) -> Vec<DenyRule> {
        if enabled.is_empty() {
            tracing::debug!(level = %ctx.level, "no framework enabled; shared controls inactive");
            return Vec::new();
        }
        compile_table(RuleCategory::Shared, controls::shared::CONTROLS, ctx, exceptions)
    }
}
