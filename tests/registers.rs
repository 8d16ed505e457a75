mod common;

use common::FakeInferior;
use trace_dbg::error::SnapshotStep;
use trace_dbg::linux::registers::{self, CpuRegs};
use trace_dbg::{Error, Register};

#[test]
fn every_register_round_trips() {
    let mut inferior = FakeInferior::new();

    for (index, register) in Register::all().enumerate() {
        let value = 0x1000 + index as u64;

        registers::set_value(&mut inferior, register, value).unwrap();
        assert_eq!(registers::value_of(&inferior, register).unwrap(), value, "{register}");
    }
}

#[test]
fn writes_leave_other_registers_alone() {
    let mut inferior = FakeInferior::new();

    for (index, register) in Register::all().enumerate() {
        registers::set_value(&mut inferior, register, index as u64).unwrap();
    }

    registers::set_value(&mut inferior, Register::Rbx, u64::MAX).unwrap();

    for (index, register) in Register::all().enumerate() {
        let expected = if register == Register::Rbx { u64::MAX } else { index as u64 };
        assert_eq!(registers::value_of(&inferior, register).unwrap(), expected, "{register}");
    }
}

#[test]
fn registers_map_to_their_snapshot_fields() {
    let mut inferior = FakeInferior::new();
    inferior.registers.rip = 0x401000;
    inferior.registers.eflags = 0x246;
    inferior.registers.orig_rax = u64::MAX;

    assert_eq!(registers::value_of(&inferior, Register::Rip).unwrap(), 0x401000);
    assert_eq!(registers::value_of(&inferior, Register::Rflags).unwrap(), 0x246);
    assert_eq!(registers::value_of(&inferior, Register::OrigRax).unwrap(), u64::MAX);

    registers::set_value(&mut inferior, Register::FsBase, 0x7f00_0000).unwrap();
    assert_eq!(inferior.registers.fs_base, 0x7f00_0000);
}

#[test]
fn batch_access_uses_one_snapshot() {
    let mut inferior = FakeInferior::new();

    inferior
        .set_registers(&[Register::Rax, Register::Rdi, Register::Rsp], &[1, 2, 3])
        .unwrap();

    assert_eq!(
        inferior
            .get_registers(&[Register::Rsp, Register::Rax, Register::Rdi])
            .unwrap(),
        [3, 1, 2]
    );
}

#[test]
fn dump_lists_every_register_in_table_order() {
    let mut inferior = FakeInferior::new();
    inferior.registers.r15 = 15;
    inferior.registers.gs = 0x2b;

    let dump = registers::dump(&inferior).unwrap();

    assert_eq!(dump.len(), 27);
    assert_eq!(dump.first(), Some(&(Register::R15, 15)));
    assert_eq!(dump.last(), Some(&(Register::Gs, 0x2b)));
}

#[test]
fn failed_fetch_is_fatal() {
    let mut inferior = FakeInferior::new();
    inferior.fail_snapshot = true;

    let error = registers::value_of(&inferior, Register::Rax).unwrap_err();

    assert!(error.is_fatal());
    assert!(matches!(
        error,
        Error::TargetUnreachable { step: SnapshotStep::Fetch, register: "rax", .. }
    ));
    assert!(error.to_string().contains("rax"));

    assert!(registers::dump(&inferior).unwrap_err().is_fatal());
}

#[test]
fn failed_write_is_fatal() {
    let mut inferior = FakeInferior::new();
    inferior.fail_snapshot = true;

    let error = registers::set_value(&mut inferior, Register::Rip, 0).unwrap_err();

    assert!(error.is_fatal());
    assert!(matches!(error, Error::TargetUnreachable { register: "rip", .. }));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic]
fn batch_write_rejects_mismatched_lengths() {
    let mut inferior = FakeInferior::new();

    let _ = inferior.set_registers(&[Register::Rax, Register::Rbx], &[1]);
}
