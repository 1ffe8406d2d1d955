//! Self-registration and discovery of test cases.
//!
//! Test cases register themselves at link time with
//! [`register_test_case!`](crate::register_test_case); there is no master
//! list to maintain. Discovery keeps the registrations made from `test_*`
//! modules, collapses repeats and hands them out sorted by name.

use std::collections::BTreeMap;

use crate::case::TestCase;
use crate::error::{HarnessError, Result};

/// Prefix of the modules whose registrations are discovered.
pub const TEST_MODULE_PREFIX: &str = "test_";

/// Builds a case, given the verbosity flag.
pub type CaseFactory = fn(bool) -> Box<dyn TestCase>;

/// One registered test case type.
#[derive(Debug)]
pub struct TestCaseRegistration {
    /// `module_path!()` of the registering module.
    pub module: &'static str,
    /// Case type name.
    pub name: &'static str,
    /// Constructor.
    pub factory: CaseFactory,
}

impl TestCaseRegistration {
    /// Creates a registration.
    #[must_use]
    pub const fn new(module: &'static str, name: &'static str, factory: CaseFactory) -> Self {
        Self {
            module,
            name,
            factory,
        }
    }

    /// Last segment of the module path.
    #[must_use]
    pub fn module_name(&self) -> &'static str {
        self.module.rsplit("::").next().unwrap_or(self.module)
    }

    /// Returns true if the registering module follows the `test_*` convention.
    #[must_use]
    pub fn is_test_module(&self) -> bool {
        self.module_name().starts_with(TEST_MODULE_PREFIX)
    }

    /// Instantiates the case.
    #[must_use]
    pub fn instantiate(&self, verbose: bool) -> Box<dyn TestCase> {
        (self.factory)(verbose)
    }
}

inventory::collect!(TestCaseRegistration);

/// Registers a test case type for discovery.
///
/// The type needs an inherent `fn new(verbose: bool) -> Self`, and the
/// invocation must sit in a module named `test_*`.
///
/// ```rust,ignore
/// pub struct TestFeed { /* ... */ }
/// logprobe_harness::register_test_case!(TestFeed);
/// ```
#[macro_export]
macro_rules! register_test_case {
    ($ty:ident) => {
        const _: () = {
            fn factory(verbose: bool) -> ::std::boxed::Box<dyn $crate::TestCase> {
                ::std::boxed::Box::new(<$ty>::new(verbose))
            }
            $crate::inventory::submit! {
                $crate::registry::TestCaseRegistration::new(
                    ::std::module_path!(),
                    ::std::stringify!($ty),
                    factory,
                )
            }
        };
    };
}

/// Every registered test case from a `test_*` module, sorted by name.
///
/// # Errors
/// Returns a fatal discovery error when two modules register the same name.
pub fn discover() -> Result<Vec<&'static TestCaseRegistration>> {
    discover_from(inventory::iter::<TestCaseRegistration>)
}

/// Discovery over an explicit set of registrations.
///
/// # Errors
/// Returns a fatal discovery error when two modules register the same name.
pub fn discover_from<'a, I>(registrations: I) -> Result<Vec<&'a TestCaseRegistration>>
where
    I: IntoIterator<Item = &'a TestCaseRegistration>,
{
    let mut found: BTreeMap<&'static str, &'a TestCaseRegistration> = BTreeMap::new();
    for registration in registrations {
        if !registration.is_test_module() {
            tracing::trace!(
                case = registration.name,
                module = registration.module,
                "ignoring registration outside a test module"
            );
            continue;
        }
        match found.get(registration.name) {
            Some(existing) if existing.module == registration.module => {}
            Some(existing) => {
                return Err(HarnessError::discovery(format!(
                    "test case {} registered by both {} and {}",
                    registration.name, existing.module, registration.module
                )));
            }
            None => {
                found.insert(registration.name, registration);
            }
        }
    }
    tracing::debug!(count = found.len(), "discovered test cases");
    Ok(found.into_values().collect())
}

/// Keeps the cases named in `names`, in discovery order.
///
/// An empty filter keeps everything.
///
/// # Errors
/// Returns a discovery error for a name that matches no case.
pub fn select<'a>(
    cases: Vec<&'a TestCaseRegistration>,
    names: &[String],
) -> Result<Vec<&'a TestCaseRegistration>> {
    if names.is_empty() {
        return Ok(cases);
    }
    if let Some(unknown) = names.iter().find(|n| !cases.iter().any(|c| c.name == n.as_str())) {
        return Err(HarnessError::discovery(format!("no test case named {unknown}")));
    }
    Ok(cases
        .into_iter()
        .filter(|c| names.iter().any(|n| n == c.name))
        .collect())
}
