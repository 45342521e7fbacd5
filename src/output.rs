//! Final assembly: one QASM file per region, containing the header, the
//! gate definitions the region depends on, and the lowered instructions.

use std::collections::BTreeMap;

use crate::qasm::{Gate, Program};

pub const PROGRAM_HEADER: &str = "// Generated by the Funq compiler\nOPENQASM 2.0;\ninclude \"qelib1.inc\";\n";

/// Deterministic serialization of every program to `(region name, text)`
/// pairs.
pub fn generate_output(
    programs: &BTreeMap<String, Program>,
    gates: &BTreeMap<String, Gate>,
) -> Vec<(String, String)> {
    let mut files = Vec::new();
    for (name, program) in programs {
        let mut text = format!(
            "// Program: {}, {} qubits\n{}",
            name, program.qubits, PROGRAM_HEADER
        );
        for dependency in &program.dependencies {
            if let Some(gate) = gates.get(dependency) {
                text.push_str(&gate.emit());
                text.push('\n');
            }
        }
        text.push_str(&program.emit());
        files.push((name.clone(), text));
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qasm::Instruction;

    #[test]
    fn header_names_the_region_and_qubit_count() {
        let mut programs = BTreeMap::new();
        programs.insert(
            "Bell".to_string(),
            Program {
                qubits: 2,
                instructions: vec![Instruction::QuantumInitialization {
                    name: "q".into(),
                    size: 2,
                    bits: vec![false, false],
                }],
                dependencies: vec![],
                needs_measurement_qubit: false,
            },
        );
        let files = generate_output(&programs, &BTreeMap::new());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "Bell");
        assert_eq!(
            files[0].1,
            "// Program: Bell, 2 qubits\n// Generated by the Funq compiler\nOPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n"
        );
    }

    #[test]
    fn only_dependency_gates_are_included() {
        let mut programs = BTreeMap::new();
        programs.insert(
            "R".to_string(),
            Program {
                qubits: 1,
                instructions: vec![],
                dependencies: vec!["used".to_string()],
                needs_measurement_qubit: false,
            },
        );
        let mut gates = BTreeMap::new();
        for name in ["used", "unused"] {
            gates.insert(
                name.to_string(),
                Gate {
                    name: name.to_string(),
                    cargs: vec![],
                    qargs: vec!["t".to_string()],
                    instructions: vec![],
                },
            );
        }
        let files = generate_output(&programs, &gates);
        assert!(files[0].1.contains("gate used t {"));
        assert!(!files[0].1.contains("gate unused"));
    }
}
