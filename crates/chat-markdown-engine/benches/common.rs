// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_chat_log(messages: usize) -> String {
    let base = [
        "hey <@1234>, did you see **this**?",
        "> quoting you\nand replying ||with a spoiler||",
        "- one\n- two\n  - nested <:wave:42>",
        "```rust\nfn main() {\n    println!(\"hi\");\n}\n```",
        "check https://example.com and [the docs](http://docs.example.com \"docs\")",
        "_a *b* c_ ~~gone~~ __under__ `code` @everyone",
    ];
    (0..messages)
        .map(|i| base[i % base.len()])
        .collect::<Vec<_>>()
        .join("\n")
}

#[allow(dead_code)]
pub fn generate_nested_emphasis(depth: usize) -> String {
    let mut content = String::from("x");
    for level in 0..depth {
        let marker = ["**", "__", "~~", "||"][level % 4];
        content = format!("{marker}{content}{marker}");
    }
    content
}
