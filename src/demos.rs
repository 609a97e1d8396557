//! Small example programs shipped with the command line driver.

pub const DEMOS: [(&str, &str); 5] = [
    (
        "Simple Banglish Variables",
        "dhore x = 10;
dhore y = 5;
dhore jogfol = x + y;
dekhao(jogfol);
",
    ),
    (
        "Banglish Conditional",
        "dhore boyosh = 18;
jode (boyosh >= 18) {
    dekhao(\"You are adult\");
} onnathay {
    dekhao(\"You are minor\");
}
",
    ),
    (
        "Banglish Loop",
        "dhore i = 1;
jotokkhon (i <= 5) {
    dekhao(i);
    i = i + 1;
}
",
    ),
    (
        "Banglish Function",
        "function jog(a, b) {
    ferot a + b;
}
dhore fol = jog(10, 20);
dekhao(fol);
",
    ),
    (
        "Simple Math",
        "dhore a = 15;
dhore b = 3;
dhore gunfol = a * b;
dekhao(\"Result: \" + gunfol);
",
    ),
];

/// Looks a demo up by name, ignoring case.
pub fn find(name: &str) -> Option<&'static str> {
    DEMOS
        .iter()
        .find(|(demo, _)| demo.eq_ignore_ascii_case(name))
        .map(|(_, source)| *source)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    DEMOS.iter().map(|(name, _)| *name)
}
