//! C++ code generation.
//!
//! The generator walks the finished [`Program`] arena once, function by
//! function, and renders C++ text. How a value list is rendered depends
//! on the generation mode of the statement being walked, not on the
//! list itself: quoted characters when streamed to the console, a
//! chained numeral stream inside any other insertion, and a braced
//! aggregate everywhere else.

use std::collections::HashSet;

use crate::parser::CONSOLE;
use crate::program::{
    CallId, DeclarableKind, ExprId, Expression, Function, IdentId, InsertId, ListId, Program,
    ScopeId, Statement, StmtId, ValueKind,
};

/// Fixed header of every generated translation unit.
pub const PRELUDE: &str = "#include <iostream>\n#include <vector>\nusing value = int;\nusing list = std::vector<int>;\n";

/// Renders the whole program as C++ source text.
pub fn generate_cpp(program: &Program<'_>) -> String {
    let mut generator = Generator::new(program);
    generator.run();
    generator.out
}

struct Generator<'a, 'src> {
    program: &'a Program<'src>,
    out: String,

    // Modes scoped to the statement currently being rendered.
    insert_stmt: bool,
    inserting_chars: bool,
    insert_at_end: bool,

    // State scoped to the function currently being rendered.
    in_main: bool,
    scope: ScopeId,
    declared: HashSet<String>,
    pending_declarations: String,
}

impl<'a, 'src> Generator<'a, 'src> {
    fn new(program: &'a Program<'src>) -> Self {
        Generator {
            program,
            out: String::new(),
            insert_stmt: false,
            inserting_chars: false,
            insert_at_end: false,
            in_main: false,
            scope: ScopeId::new(0),
            declared: HashSet::new(),
            pending_declarations: String::new(),
        }
    }

    fn run(&mut self) {
        self.out.push_str(PRELUDE);
        let program = self.program;
        for function in &program.functions {
            self.generate_function(function);
        }
    }

    fn generate_function(&mut self, function: &'a Function<'src>) {
        let program = self.program;
        self.in_main = function.identity.text == "main";
        self.scope = function.scope;
        self.declared.clear();

        if self.in_main {
            self.out.push_str("int main(");
        } else {
            let name = program
                .fetch(function.scope, function.identity.text)
                .map(|declarable| declarable.c_identity.as_str())
                .unwrap_or(function.identity.text);
            self.out.push_str("void ");
            self.out.push_str(name);
            self.out.push('(');
        }

        for (index, param) in function.params.iter().enumerate() {
            if index > 0 {
                self.out.push(',');
            }
            self.out.push_str(value_kind_keyword(param.kind));
            let name = program
                .fetch(function.scope, param.identity.text)
                .map(|declarable| declarable.c_identity.as_str())
                .unwrap_or(param.identity.text);
            // Parameters are declared by the signature itself.
            self.declared.insert(name.to_string());
            self.out.push_str(name);
        }
        self.out.push(')');

        self.out.push('{');
        for statement in &program.scope(function.scope).statements {
            self.generate_statement(*statement);
        }
        if self.in_main {
            self.out.push_str("return 0;");
        }
        self.out.push('}');
    }

    /// Renders one statement into its own buffer, then flushes any
    /// declarations the statement triggered ahead of it. The rendering
    /// modes are statement-local and reset here.
    fn generate_statement(&mut self, id: StmtId) {
        self.insert_stmt = false;
        self.inserting_chars = false;
        self.insert_at_end = false;
        self.pending_declarations.clear();

        let saved = std::mem::take(&mut self.out);
        match self.program.statement(id) {
            Statement::Expression(expression) => self.generate_expression(expression, false),
            Statement::Insert(insert) => {
                self.insert_stmt = true;
                self.insert_at_end = self.program.insert(insert).insert_at_end;
                self.generate_insert(insert, true);
            }
        }
        let rendered = std::mem::replace(&mut self.out, saved);

        self.out.push_str(&self.pending_declarations);
        self.out.push_str(&rendered);
        self.out.push(';');
    }

    fn generate_insert(&mut self, id: InsertId, leading: bool) {
        let insert = self.program.insert(id);
        self.generate_insert_side(insert.subject, leading);
        self.out.push_str(self.operator());
        self.generate_insert_side(insert.insert, false);
    }

    /// A side of an insertion is either a plain expression or a further
    /// chain link, which continues with the same operator.
    fn generate_insert_side(&mut self, id: StmtId, leading: bool) {
        match self.program.statement(id) {
            Statement::Insert(inner) => self.generate_insert(inner, leading),
            Statement::Expression(expression) => self.generate_expression(expression, leading),
        }
    }

    fn generate_expression(&mut self, id: ExprId, leading: bool) {
        match self.program.expression(id) {
            Expression::Identity(identifier) => self.generate_identity(identifier, leading),
            Expression::List(list) => self.generate_value_list(list),
            Expression::Call(call) => self.generate_call(call),
        }
    }

    fn generate_identity(&mut self, id: IdentId, leading: bool) {
        let token = self.program.identifier(id);
        if token.text == CONSOLE {
            self.out.push_str(if self.insert_at_end {
                "std::cin"
            } else {
                "std::cout"
            });
            // Only the console as the leading operand of an output
            // stream turns on character rendering.
            if leading && self.insert_stmt && !self.insert_at_end {
                self.inserting_chars = true;
            }
            return;
        }

        let program = self.program;
        match program.fetch(self.scope, token.text) {
            Some(declarable) => {
                if let DeclarableKind::Variable(kind) = declarable.kind {
                    if !self.declared.contains(&declarable.c_identity) {
                        self.declared.insert(declarable.c_identity.clone());
                        self.pending_declarations.push_str(value_kind_keyword(kind));
                        self.pending_declarations.push_str(&declarable.c_identity);
                        self.pending_declarations.push(';');
                    }
                }
                self.out.push_str(&declarable.c_identity);
            }
            None => self.out.push_str(token.text),
        }
    }

    fn generate_value_list(&mut self, id: ListId) {
        let program = self.program;
        let values = &program.value_list(id).values;

        if self.inserting_chars {
            self.out.push('"');
            for &value in values {
                self.push_escaped_char(value);
            }
            self.out.push('"');
        } else if self.insert_stmt {
            let operator = self.operator();
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    self.out.push_str(operator);
                }
                self.out.push_str(&value.to_string());
            }
        } else {
            self.out.push('{');
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    self.out.push(',');
                }
                self.out.push_str(&value.to_string());
            }
            self.out.push('}');
        }
    }

    fn generate_call(&mut self, id: CallId) {
        let program = self.program;
        let call = program.call(id);
        let name = program
            .fetch(self.scope, call.callee.text)
            .filter(|declarable| declarable.kind == DeclarableKind::Function)
            .map(|declarable| declarable.c_identity.as_str())
            .unwrap_or(call.callee.text);

        self.out.push_str(name);
        self.out.push('(');
        for (index, argument) in call.args.iter().enumerate() {
            if index > 0 {
                self.out.push(',');
            }
            self.generate_expression(*argument, false);
        }
        self.out.push(')');
    }

    fn push_escaped_char(&mut self, value: i64) {
        match u32::try_from(value).ok().and_then(char::from_u32) {
            Some('"') => self.out.push_str("\\\""),
            Some('\\') => self.out.push_str("\\\\"),
            Some('\n') => self.out.push_str("\\n"),
            Some('\t') => self.out.push_str("\\t"),
            Some(c) => self.out.push(c),
            // A code outside the character range cannot round-trip as text.
            None => {}
        }
    }

    fn operator(&self) -> &'static str {
        if self.insert_at_end { ">>" } else { "<<" }
    }
}

fn value_kind_keyword(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Value => "value ",
        ValueKind::List => "list ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::parse;

    fn generate(source: &str) -> String {
        let mut diagnostics = Diagnostics::new();
        let program = parse(source, &mut diagnostics);
        assert!(
            !diagnostics.has_errors(),
            "unexpected errors: {:?}",
            diagnostics.all()
        );
        generate_cpp(&program)
    }

    #[test]
    fn empty_main_gets_prelude_and_exit_status() {
        let cpp = generate("main() {\n}");
        assert!(cpp.starts_with(PRELUDE));
        assert!(cpp.ends_with("int main(){return 0;}"));
    }

    #[test]
    fn streams_string_to_console_as_characters() {
        let cpp = generate("main() { console << \"Hi\" }");
        assert!(cpp.ends_with("int main(){std::cout<<\"Hi\";return 0;}"));
    }

    #[test]
    fn standalone_list_renders_as_aggregate() {
        let cpp = generate("main() {\n\"AB\"\n}");
        assert!(cpp.contains("{65,66};"));
    }

    #[test]
    fn non_console_insertion_renders_numerals() {
        let cpp = generate("main() {\nx << \"AB\"\n}");
        assert!(cpp.contains("value x_;x_<<65<<66;"));
        assert!(!cpp.contains("\"AB\""));
    }

    #[test]
    fn console_extraction_reads_from_cin() {
        let cpp = generate("main() {\nconsole >> x\n}");
        assert!(cpp.contains("value x_;std::cin>>x_;"));
    }

    #[test]
    fn chains_collapse_into_one_statement() {
        let cpp = generate("main() {\nconsole << \"Hi\" << x\n}");
        assert!(cpp.contains("value x_;std::cout<<\"Hi\"<<x_;"));
    }

    #[test]
    fn trailing_console_does_not_enable_character_mode() {
        let cpp = generate("main() {\nx << \"A\" << console\n}");
        assert!(cpp.contains("x_<<65<<std::cout;"));
    }

    #[test]
    fn declares_each_variable_once_at_first_use() {
        let cpp = generate("main() {\nx << \"A\"\nx << \"B\"\n}");
        assert!(cpp.contains("value x_;x_<<65;x_<<66;"));
    }

    #[test]
    fn parameters_are_typed_and_not_redeclared() {
        let cpp = generate("copy(a, b[]) {\nb << a\n}");
        assert!(cpp.contains("void copy_(value a_,list b_){b_<<a_;}"));
    }

    #[test]
    fn calls_use_mangled_names() {
        let cpp = generate("greet() {\nconsole << \"Hi\"\n}\nmain() {\ngreet()\n}");
        assert!(cpp.contains("void greet_(){std::cout<<\"Hi\";}"));
        assert!(cpp.contains("int main(){greet_();return 0;}"));
    }

    #[test]
    fn special_characters_are_escaped_in_character_mode() {
        let cpp = generate("main() {\nconsole << \"a\tb\"\n}");
        assert!(cpp.contains("std::cout<<\"a\\tb\";"));
    }

    #[test]
    fn call_arguments_pass_values() {
        let cpp = generate("show(v) {\nconsole << v\n}\nmain() {\nshow(x)\n}");
        assert!(cpp.contains("void show_(value v_){std::cout<<v_;}"));
        assert!(cpp.contains("int main(){value x_;show_(x_);return 0;}"));
    }
}
