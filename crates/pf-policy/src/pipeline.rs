// pipeline.rs — End-to-end compilation for one scope, and batches of scopes.
//
// Stages, in order:
//   1. scope resolution and input validation (ValidationError)
//   2. emergency override gate (EmergencyOverrideError)
//   3. exception resolution (ConfigurationError when fail-closed)
//   4. compliance level
//   5. framework and shared rule compilation
//   6. assembly (ConflictError), with rules withheld while overridden
//
// Every stage is pure. The evaluation time comes in on the input; nothing
// here reads a clock.

use std::thread;

use crate::assembler::{PolicySet, PolicySetAssembler};
use crate::compiler::{FrameworkRuleCompiler, SharedControlCompiler};
use crate::controls::ControlContext;
use crate::emergency::OverrideGate;
use crate::error::PolicyError;
use crate::exception::{resolve_exceptions, BreakGlassResolver, ExceptionResolution};
use crate::input::CompilationInput;
use crate::level::ComplianceLevel;

/// A compiled policy set plus the exception report behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOutcome {
    pub policy_set: PolicySet,
    pub exceptions: ExceptionResolution,
}

/// Compile one scope.
pub fn compile(input: &CompilationInput) -> Result<CompilationOutcome, PolicyError> {
    let scope = input.scope.resolve()?;
    let at = input.evaluation_time.ok_or_else(|| {
        PolicyError::validation(
            &scope.id,
            "evaluation_time",
            "an explicit evaluation time is required",
        )
    })?;
    input.validate()?;

    let gate = OverrideGate::from_request(&scope.id, &input.emergency_override)?;
    let exceptions = resolve_exceptions(
        &scope.id,
        &input.exception_sources,
        gate.is_overridden(),
        at,
    )?;

    let level = ComplianceLevel::compute(&input.enabled_frameworks, input.data_classification);
    let ctx = ControlContext {
        level,
        classification: input.data_classification,
        params: &input.framework_params,
        overrides: &input.security_control_overrides,
    };
    let framework_rules =
        FrameworkRuleCompiler::compile_all(&input.enabled_frameworks, &ctx, &exceptions.principals);
    let shared_rules =
        SharedControlCompiler::compile(&input.enabled_frameworks, &ctx, &exceptions.principals);

    let policy_set = PolicySetAssembler::assemble(
        scope,
        level,
        input.enabled_frameworks.clone(),
        &gate,
        framework_rules,
        shared_rules,
    )?;

    tracing::info!(
        scope = %policy_set.scope.id,
        level = %policy_set.compliance_level,
        rules = policy_set.summary.rule_count,
        suppressed = policy_set.summary.suppressed_rule_count,
        exceptions = exceptions.principals.len(),
        "policy set compiled"
    );

    Ok(CompilationOutcome {
        policy_set,
        exceptions,
    })
}

/// Compile one scope, asking `resolver` for the break-glass group when the
/// input names none and carries no remote result of its own.
pub fn compile_with_resolver(
    input: &CompilationInput,
    resolver: &dyn BreakGlassResolver,
) -> Result<CompilationOutcome, PolicyError> {
    if input.needs_remote_break_glass() {
        return compile(&input.clone().with_resolved_fallback(resolver));
    }
    compile(input)
}

/// Compile independent scopes in parallel. Results keep input order.
pub fn compile_batch(inputs: &[CompilationInput]) -> Vec<Result<CompilationOutcome, PolicyError>> {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1);

    let mut results = Vec::with_capacity(inputs.len());
    for chunk in inputs.chunks(workers) {
        thread::scope(|s| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|input| s.spawn(move || compile(input)))
                .collect();
            for handle in handles {
                results.push(
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
                );
            }
        });
    }
    results
}
