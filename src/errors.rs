use std::fmt;

use thiserror::Error;

/// Every diagnostic the compiler can produce. Each kind maps to a stable
/// error code (`S*` syntax, `V*`/`T*` names and types, `F*` functions,
/// `R*` regions, `C*` classical, `Q*` quantum, `E*` evaluation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Unexpected token, was expecting one of: {0}")]
    UnexpectedToken(String),
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),
    #[error("Typename '{0}' does not name a valid type")]
    UnknownType(String),
    #[error("Only function calls are allowed in function")]
    DeclarationOutsideRegion,
    #[error("Recursion not allowed in function")]
    RecursionNotAllowed,
    #[error("Incorrect number of arguments specified to function")]
    WrongArgumentCount,
    #[error("Incorrect type for argument '{param}' of function '{function}'. Expected type '{expected}', got '{actual}'")]
    ArgumentTypeMismatch {
        param: String,
        function: String,
        expected: String,
        actual: String,
    },
    #[error("Function name '{0}' is identical to a previously declared function name")]
    DuplicateFunction(String),
    #[error("Type of function argument can only be a constant or qubit")]
    RegisterFunctionParameter,
    #[error("At least one quantum argument is required for function '{0}'")]
    NoQuantumArgument(String),
    #[error("Function '{0}' is not defined")]
    UnknownFunction(String),
    #[error("Region name '{0}' is identical to a previously declared region name")]
    DuplicateRegion(String),
    #[error("Quantum variable '{variable}' allocates more qubits than allowed by the region '{region}'")]
    QubitBudgetExceeded { variable: String, region: String },
    #[error("Quantum variable '{variable}' allocates more qubits than allowed by the region '{region}'. Note that it is possible the limit was surpassed because you initialized at least one non-zero classical register, which requires one qubit")]
    QubitBudgetExceededWithHelper { variable: String, region: String },
    #[error("Classical variable name '{0}' is identical to a previously declared variable")]
    DuplicateClassicalVariable(String),
    #[error("Measurement target '{0}' is not a classical register")]
    MeasurementTargetNotRegister(String),
    #[error("Classical variable slice indexes '{0}' to '{1}' are out of bounds")]
    ClassicalSliceOutOfBounds(i64, i64),
    #[error("Expected classical type in classical variable declaration")]
    QuantumTypeInClassicalDeclaration,
    #[error("Classical expression does not match variable type")]
    InitializerTypeMismatch,
    #[error("Expected quantum register type in quantum variable declaration")]
    NonRegisterQuantumDeclaration,
    #[error("Quantum variable name '{0}' is identical to a previously declared variable")]
    DuplicateQuantumVariable(String),
    #[error("Quantum variable slice indexes '{0}' to '{1}' are out of bounds")]
    QuantumSliceOutOfBounds(i64, i64),
    #[error("Quantum variable index '{0}' is out of bounds")]
    QuantumIndexOutOfBounds(i64),
    #[error("Measurement source '{0}' is not a quantum register")]
    MeasurementSourceNotQuantum(String),
    #[error("Quantum variable has already been measured, and cannot be measured again")]
    RepeatedMeasurement,
    #[error("Quantum variable cannot be used after being measured")]
    UseAfterMeasurement,
    #[error("Constant expression cannot be evaluated")]
    ConstantEvaluation,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnexpectedToken(_) => "S0",
            ErrorKind::UndefinedVariable(_) => "V0",
            ErrorKind::UnknownType(_) => "T0",
            ErrorKind::DeclarationOutsideRegion => "F0",
            ErrorKind::RecursionNotAllowed => "F1",
            ErrorKind::WrongArgumentCount => "F2",
            ErrorKind::ArgumentTypeMismatch { .. } => "F3",
            ErrorKind::DuplicateFunction(_) => "F5",
            ErrorKind::RegisterFunctionParameter => "F6",
            ErrorKind::NoQuantumArgument(_) => "F7",
            ErrorKind::UnknownFunction(_) => "F8",
            ErrorKind::DuplicateRegion(_) => "R0",
            ErrorKind::QubitBudgetExceeded { .. } => "R1",
            ErrorKind::QubitBudgetExceededWithHelper { .. } => "R1N",
            ErrorKind::DuplicateClassicalVariable(_) => "C0",
            ErrorKind::MeasurementTargetNotRegister(_) => "C2",
            ErrorKind::ClassicalSliceOutOfBounds(_, _) => "C3",
            ErrorKind::QuantumTypeInClassicalDeclaration => "C4",
            ErrorKind::InitializerTypeMismatch => "C5",
            ErrorKind::NonRegisterQuantumDeclaration => "Q0",
            ErrorKind::DuplicateQuantumVariable(_) => "Q2",
            ErrorKind::QuantumSliceOutOfBounds(_, _) => "Q2",
            ErrorKind::QuantumIndexOutOfBounds(_) => "Q3",
            ErrorKind::MeasurementSourceNotQuantum(_) => "Q4",
            ErrorKind::RepeatedMeasurement => "Q5",
            ErrorKind::UseAfterMeasurement => "Q6",
            ErrorKind::ConstantEvaluation => "E0",
        }
    }
}

/// An error tied to a specific line and column of the input program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerError {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
}

impl CompilerError {
    pub fn new(kind: ErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = self.kind.to_string();
        let header = format!("Error at line {}, column {}:", self.line, self.column);
        let length = (header.len() + 2).max(msg.len() + 3);
        let header_spacing = length - (header.len() + 1);
        let msg_spacing = length - (msg.len() + 2);
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(length))?;
        writeln!(f, "{}{}|", header, " ".repeat(header_spacing))?;
        writeln!(f, "{}.{}|", msg, " ".repeat(msg_spacing))?;
        writeln!(f, "{}", "-".repeat(length))
    }
}

impl std::error::Error for CompilerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_taxonomy() {
        assert_eq!(ErrorKind::UndefinedVariable("x".into()).code(), "V0");
        assert_eq!(ErrorKind::RepeatedMeasurement.code(), "Q5");
        assert_eq!(
            ErrorKind::QubitBudgetExceededWithHelper {
                variable: "q".into(),
                region: "R".into()
            }
            .code(),
            "R1N"
        );
    }

    #[test]
    fn display_is_framed() {
        let err = CompilerError::new(ErrorKind::UndefinedVariable("x".into()), 3, 7);
        let text = err.to_string();
        let lines: Vec<&str> = text.lines().collect();
        // Leading blank line, frame, header, message, frame.
        assert_eq!(lines[0], "");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("Error at line 3, column 7:"));
        assert!(lines[2].ends_with('|'));
        assert!(lines[3].starts_with("Variable 'x' is not defined."));
        assert!(lines[3].ends_with('|'));
        assert_eq!(lines[1], lines[4]);
    }
}
