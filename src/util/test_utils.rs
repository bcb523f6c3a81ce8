use crate::{
    analyzer,
    config::AnalyzerConfig,
    lexer::LexOptions,
    parser,
    token::Spanned,
    util::fmt::tree,
};

pub fn format_errors<E: std::fmt::Display>(e: &[Spanned<E>]) -> Vec<String> {
    e.iter().map(|e| format!("{e:#}")).collect()
}

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    ParserExpr(&'static str),
    AnalyzerProgram(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    TreeError(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    match test {
        Test::ParserProgram(input) => {
            let parsed = parser::parse_program(input, LexOptions::default());
            let tree = tree::print_program_string(&parsed.program);
            (tree, format_errors(&parsed.errors))
        }
        Test::ParserExpr(input) => {
            let (expr, errors) = parser::parse_expr(input);
            let tree = tree::print_expr_string(&expr);
            (tree, format_errors(&errors))
        }
        Test::AnalyzerProgram(input) => {
            let parsed = parser::parse_program(input, LexOptions::default());
            let mut errors = format_errors(&parsed.errors);

            let no_files = |_: &std::path::Path| false;
            let analysis = analyzer::analyze(&parsed.program, &AnalyzerConfig::default(), &no_files);
            errors.extend(format_errors(&analysis.errors));

            let tree = tree::print_program_string(&parsed.program);
            (tree, errors)
        }
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::TreeError(expected_tree) => {
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, tree_error, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeError(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {{
        const EXPECTED: &[&str] = $expected;
        crate::util::test_utils::Assertion::ExpectedErrors(EXPECTED)
    }};

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, expr), $source:expr) => {
        crate::util::test_utils::Test::ParserExpr($source)
    };
    (@@get_test(analyzer, program), $source:expr) => {
        crate::util::test_utils::Test::AnalyzerProgram($source)
    };
}
pub(crate) use tree_tests;
