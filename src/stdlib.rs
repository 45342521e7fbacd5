//! The Funq standard library: builtin gate names, the OpenQASM gates they
//! map to, and their fixed signatures for arity and type checking.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::types::{TYPE_CONST, TYPE_QUBIT};

pub struct StandardGate {
    /// Name of the gate in the emitted OpenQASM.
    pub qasm_name: &'static str,
    /// `(parameter name, typename)` pairs, classical parameters first where
    /// the QASM primitive takes them.
    pub args: &'static [(&'static str, &'static str)],
}

lazy_static! {
    static ref STANDARD_GATES: HashMap<&'static str, StandardGate> = {
        let mut m = HashMap::new();
        m.insert(
            "hadamard",
            StandardGate {
                qasm_name: "h",
                args: &[("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "not",
            StandardGate {
                qasm_name: "x",
                args: &[("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "x",
            StandardGate {
                qasm_name: "x",
                args: &[("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "y",
            StandardGate {
                qasm_name: "y",
                args: &[("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "z",
            StandardGate {
                qasm_name: "z",
                args: &[("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "cx",
            StandardGate {
                qasm_name: "cx",
                args: &[("control", TYPE_QUBIT), ("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "swap",
            StandardGate {
                qasm_name: "swap",
                args: &[("a", TYPE_QUBIT), ("b", TYPE_QUBIT)],
            },
        );
        m.insert(
            "ccx",
            StandardGate {
                qasm_name: "ccx",
                args: &[("c1", TYPE_QUBIT), ("c2", TYPE_QUBIT), ("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "rx",
            StandardGate {
                qasm_name: "rx",
                args: &[("theta", TYPE_CONST), ("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "ry",
            StandardGate {
                qasm_name: "ry",
                args: &[("theta", TYPE_CONST), ("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "rz",
            StandardGate {
                qasm_name: "rz",
                args: &[("theta", TYPE_CONST), ("arg", TYPE_QUBIT)],
            },
        );
        m.insert(
            "universal",
            StandardGate {
                qasm_name: "U",
                args: &[
                    ("c1", TYPE_CONST),
                    ("c2", TYPE_CONST),
                    ("c3", TYPE_CONST),
                    ("arg", TYPE_QUBIT),
                ],
            },
        );
        m
    };
}

pub fn is_standard(function_name: &str) -> bool {
    STANDARD_GATES.contains_key(function_name)
}

pub fn standard_name(function_name: &str) -> Option<&'static str> {
    STANDARD_GATES.get(function_name).map(|g| g.qasm_name)
}

pub fn standard_args(function_name: &str) -> Option<&'static [(&'static str, &'static str)]> {
    STANDARD_GATES.get(function_name).map(|g| g.args)
}
