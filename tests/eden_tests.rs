//! Reader and printer behaviour on whole documents.
//!
//! Covers the canonical layout produced by `pprint`, comment and escape
//! handling, and stability when printed output is read back.

use aa::eden::{Document, Node, NodeId, NodeKind, ReadErrorKind, pprint, print, read};
use insta::assert_snapshot;
use rstest::rstest;

#[rstest]
#[case("(a (b))", "[(a\n  (b))]")]
#[case("\"A\"; foo bar baz\n\"B\"", "[\"A\"\n \"B\"]")]
#[case("foo.bar.baz", "[foo.bar.baz]")]
#[case("\"Hello World\\\"\\n\\t\\txyz\"", "[\"Hello World\\\"\n\t\txyz\"]")]
#[case("\\space \\a \\b \\newline", "[\\space\n \\a\n \\b\n \\newline]")]
#[case(
    "(aa.bb.cc (b) {:a 1 :b \"Some string\"}) ;; some comments\n (x y)",
    "[(aa.bb.cc\n  (b)\n  {:a 1,\n   :b \"Some string\"})\n (x\n  y)]"
)]
#[case("{:a 1 :b 2 :c \\o142}", "[{:a 1,\n  :b 2,\n  :c \\b}]")]
fn pretty_prints_canonical_layout(#[case] input: &str, #[case] expected: &str) {
    let doc = read(input).expect("valid notation");
    assert_eq!(pprint(&doc), expected);
}

#[test]
fn empty_input_prints_an_empty_vector() {
    let doc = read("  ; only a comment\n").expect("empty document");
    assert!(doc.forms().next().is_none());
    assert_eq!(pprint(&doc), "[]");
}

#[test]
fn build_specification_layout() {
    let doc = read(
        r#"{:compiler "c++" :cflags ["-O2" "-Wall"]}
           ; the library
           greet (c++lib [] {:src "greet.cc"})
           hello (c++bin [greet] {:src "hello.cc" :lib ["m"]})"#,
    )
    .expect("valid specification");
    assert_snapshot!(pprint(&doc), @r#"
[{:compiler "c++",
  :cflags ["-O2"
   "-Wall"]}
 greet
 (c++lib
  []
  {:src "greet.cc"})
 hello
 (c++bin
  [greet]
  {:src "hello.cc",
   :lib ["m"]})]
"#);
}

#[rstest]
#[case("(a (b))")]
#[case("{:a [1 2.5 #{x}] :b \"q\\\"uote\" :c \\space}")]
#[case("(defn f [x] {:k nil :t true}) ; trailing")]
fn printing_is_stable_across_a_reread(#[case] input: &str) {
    let doc = read(input).expect("valid notation");
    let printed = pprint(&doc);
    let reread = read(&printed).expect("printed notation reads back");
    let root = reread.forms().next().expect("printed root vector");
    assert_eq!(root.kind(), NodeKind::Vector);
    assert_eq!(print(root, 1), printed);
}

fn attach(doc: &mut Document, parent: NodeId, node: Node) -> NodeId {
    doc.push(parent, node).expect("parent is a collection")
}

#[test]
fn hand_built_tree_reads_back_equal() {
    let mut doc = Document::default();
    let root = doc.root_id();

    let list = attach(&mut doc, root, Node::List(Vec::new()));
    attach(&mut doc, list, Node::Symbol("compile".into()));
    attach(&mut doc, list, Node::Char('('));
    attach(&mut doc, list, Node::Char(','));
    attach(&mut doc, list, Node::Char('\n'));
    attach(&mut doc, list, Node::Char('q'));

    let map = attach(&mut doc, root, Node::Map(Vec::new()));
    attach(&mut doc, map, Node::Keyword("text".into()));
    attach(&mut doc, map, Node::String("say \"hi\"\\n\nbye".into()));
    attach(&mut doc, map, Node::Keyword("ratio".into()));
    attach(&mut doc, map, Node::Float(2.5));
    attach(&mut doc, map, Node::Keyword("min".into()));
    attach(&mut doc, map, Node::Int(i64::MIN));

    let set = attach(&mut doc, root, Node::Set(Vec::new()));
    attach(&mut doc, set, Node::Nil);
    attach(&mut doc, set, Node::Bool(false));
    let inner = attach(&mut doc, set, Node::Vector(Vec::new()));
    attach(&mut doc, inner, Node::Int(0));

    let printed = pprint(&doc);
    let reread = read(&printed).expect("printed tree reads back");
    assert_eq!(reread.forms().next(), Some(doc.root()), "{printed}");
}

#[test]
fn digit_led_names_stay_symbols() {
    let doc = read("vendor (noop [3rdparty 2to3])").expect("valid notation");
    let rule = doc.forms().nth(1).expect("rule form");
    let deps = rule.children().nth(1).expect("dependency vector");
    let names: Vec<_> = deps.children().filter_map(|dep| dep.as_symbol()).collect();
    assert_eq!(names, vec!["3rdparty", "2to3"]);
}

#[rstest]
#[case("(a", ReadErrorKind::UnclosedCollection(NodeKind::List))]
#[case("a)", ReadErrorKind::UnmatchedClose(')'))]
#[case("(a]", ReadErrorKind::MismatchedClose { open: NodeKind::List, found: ']' })]
#[case("\"abc", ReadErrorKind::UnterminatedString)]
fn malformed_documents_are_rejected(#[case] input: &str, #[case] expected: ReadErrorKind) {
    let err = read(input).expect_err("malformed notation");
    assert_eq!(err.kind(), &expected);
}
