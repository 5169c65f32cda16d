use cfgrammar::yacc::YaccKind;
use lrlex::CTLexerBuilder;

fn main() {
    CTLexerBuilder::new()
        .lrpar_config(|ctp| {
            ctp.yacckind(YaccKind::Grmtools)
                .grammar_in_src_dir("pctl.y")
                .expect("grammar configuration")
        })
        .lexer_in_src_dir("pctl.l")
        .expect("lexer configuration")
        .build()
        .expect("lexer and parser build");
}
