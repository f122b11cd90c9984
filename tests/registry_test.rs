/*!
 * Registry Tests
 * Lifecycle properties of the procedure registry through the kernel's
 * administrative surface
 */

use cap_kernel::{ExecOutcome, Executable, Kernel, ProcedureKey, RegistryError, Syscalls};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn key(label: &str) -> ProcedureKey {
    ProcedureKey::from_label(label).unwrap()
}

fn noop() -> Arc<dyn Executable> {
    Arc::new(|_: &mut dyn Syscalls, _: &[u8]| ExecOutcome::empty())
}

fn kernel() -> Kernel {
    Kernel::builder(key("entry"), noop()).build().unwrap()
}

#[test]
fn test_list_preserves_registration_order() {
    let kernel = kernel();
    kernel.create_procedure(key("k1"), noop()).unwrap();
    kernel.create_procedure(key("k2"), noop()).unwrap();
    assert_eq!(
        kernel.list_procedures(),
        vec![key("entry"), key("k1"), key("k2")]
    );
}

#[test]
fn test_list_is_idempotent_without_mutation() {
    let kernel = kernel();
    kernel.create_procedure(key("a"), noop()).unwrap();
    kernel.create_procedure(key("b"), noop()).unwrap();
    assert_eq!(kernel.list_procedures(), kernel.list_procedures());
}

#[test]
fn test_duplicate_registration_fails_and_keeps_first() {
    let kernel = kernel();
    let first: Arc<dyn Executable> = Arc::new(|_: &mut dyn Syscalls, _: &[u8]| ExecOutcome::fail(33));
    kernel
        .create_procedure(key("dup"), Arc::clone(&first))
        .unwrap();

    let err = kernel.create_procedure(key("dup"), noop()).unwrap_err();
    assert_eq!(
        err.status_code(),
        RegistryError::DuplicateKey(key("dup")).status_code()
    );

    // The original handle survives the rejected insert
    let handle = kernel.get_procedure(&key("dup")).unwrap();
    assert!(Arc::ptr_eq(&handle, &first));
    assert_eq!(kernel.list_procedures(), vec![key("entry"), key("dup")]);
}

#[test]
fn test_empty_key_is_invalid_and_never_found() {
    let kernel = kernel();
    let err = kernel
        .create_procedure(ProcedureKey::EMPTY, noop())
        .unwrap_err();
    assert_eq!(err.status_code(), RegistryError::InvalidKey.status_code());
    assert!(kernel.get_procedure(&ProcedureKey::EMPTY).is_none());
}

#[test]
fn test_lookup_miss_is_none_not_error() {
    let kernel = kernel();
    assert!(kernel.get_procedure(&key("nobody")).is_none());
}

#[test]
fn test_delete_returns_handle_and_removes_listing() {
    let kernel = kernel();
    kernel.create_procedure(key("gone"), noop()).unwrap();
    let _handle = kernel.delete_procedure(&key("gone")).unwrap();
    assert!(kernel.get_procedure(&key("gone")).is_none());
    assert_eq!(kernel.list_procedures(), vec![key("entry")]);

    let err = kernel.delete_procedure(&key("gone")).err().unwrap();
    assert_eq!(
        err.status_code(),
        RegistryError::NotFound(key("gone")).status_code()
    );
}

#[test]
fn test_entry_procedure_is_protected() {
    let kernel = kernel();
    let err = kernel.delete_procedure(&key("entry")).err().unwrap();
    assert_eq!(
        err.status_code(),
        RegistryError::EntryProcedure(key("entry")).status_code()
    );
    assert_eq!(kernel.entry_procedure(), key("entry"));
}
