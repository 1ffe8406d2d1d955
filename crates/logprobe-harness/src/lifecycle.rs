//! Test case lifecycle.
//!
//! Runs one case through its state machine and turns whatever happens
//! inside a test function (verification mismatch, error, panic) into a
//! structured [`TestFunctionResult`]. Only fatal errors leave this module.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::FutureExt;
use logprobe_core::{CaseResult, Outcome, TestFunctionResult};

use crate::case::{TestCase, test_function_names};
use crate::context::TestContext;
use crate::error::{CaseAborted, Result};

/// How one protected step ended.
enum Step<T> {
    Done(T),
    Isolated(String),
}

/// Awaits `fut`, catching panics and non-fatal errors.
async fn protect<T, F>(fut: F) -> Result<Step<T>>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(Step::Done(value)),
        Ok(Err(e)) if e.is_fatal() => Err(e),
        Ok(Err(e)) => Ok(Step::Isolated(e.to_string())),
        Err(panic) => Ok(Step::Isolated(format!("panicked: {}", panic_message(&*panic)))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs every test function of `case`.
///
/// Returns `(0, 0)` as a skipped result when `check_runnable` says no.
///
/// # Errors
/// Errors from `initialize`/`deinitialize` and fatal errors from any step
/// are returned with the functions recorded so far; the run must stop.
pub async fn run_case(
    case: &mut dyn TestCase,
    ctx: &mut TestContext,
) -> std::result::Result<CaseResult, CaseAborted> {
    let case_name = case.descriptor().name.clone();
    if !case.check_runnable(ctx) {
        tracing::info!(case = %case_name, "case not runnable here, skipping");
        ctx.reporter().progress(&format!("Skipping testcase: {case_name}"));
        return Ok(CaseResult::skipped(case_name));
    }

    let mut result = CaseResult::new(case_name.as_str());
    if let Err(error) = case.initialize(ctx).await {
        return Err(CaseAborted { partial: result, error });
    }
    for name in test_function_names(case) {
        match run_test_function(case, name, ctx).await {
            Ok(function) => result.record(function),
            Err(error) => return Err(CaseAborted { partial: result, error }),
        }
    }
    if let Err(error) = case.deinitialize(ctx).await {
        return Err(CaseAborted { partial: result, error });
    }

    tracing::debug!(
        case = %case_name,
        succeeded = result.succeeded(),
        failed = result.failed(),
        "case finished"
    );
    Ok(result)
}

/// Runs one test function: start banner, `set_up`, body, `tear_down`, end
/// banner.
///
/// `tear_down` runs whenever `set_up` succeeded, even if the body failed.
///
/// # Errors
/// Only fatal errors (controller start/stop) are returned.
pub async fn run_test_function(
    case: &mut dyn TestCase,
    name: &str,
    ctx: &mut TestContext,
) -> Result<TestFunctionResult> {
    ctx.reporter().announce_start(name);
    let started = Instant::now();

    let setup = match protect(case.set_up(ctx)).await {
        Ok(step) => step,
        Err(e) => {
            tracing::error!(test = name, error = %e, "set_up failed fatally");
            ctx.reporter().announce_end(name, false);
            return Err(e);
        }
    };
    if let Step::Isolated(diagnostic) = setup {
        tracing::warn!(test = name, diagnostic = %diagnostic, "set_up failed");
        ctx.reporter().announce_end(name, false);
        return Ok(TestFunctionResult::failed(
            name,
            format!("set_up: {diagnostic}"),
            started.elapsed(),
        ));
    }

    let body = protect(case.run_test(name, ctx)).await;
    let teardown = protect(case.tear_down(ctx)).await;

    let result = match (body, teardown) {
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(test = name, error = %e, "test function failed fatally");
            ctx.reporter().announce_end(name, false);
            return Err(e);
        }
        (Ok(Step::Done(outcome)), Ok(Step::Done(()))) => {
            TestFunctionResult::from_outcome(name, outcome, started.elapsed())
        }
        (Ok(Step::Isolated(diagnostic)), _) => {
            TestFunctionResult::failed(name, diagnostic, started.elapsed())
        }
        (Ok(Step::Done(outcome)), Ok(Step::Isolated(diagnostic))) => {
            let detail = match outcome {
                Outcome::Pass => format!("tear_down: {diagnostic}"),
                Outcome::Fail(detail) => format!("{detail}; tear_down: {diagnostic}"),
            };
            TestFunctionResult::failed(name, detail, started.elapsed())
        }
    };

    if let Some(diagnostic) = &result.diagnostic {
        tracing::warn!(test = name, diagnostic = %diagnostic, "test function failed");
        ctx.reporter().progress(diagnostic);
    }
    ctx.reporter().announce_end(name, result.passed);
    Ok(result)
}
