fn main() {
    let config = slint_build::CompilerConfiguration::new().with_style("fluent".to_string());
    slint_build::compile_with_config("ui/appwindow.slint", config).unwrap();

    println!("cargo:rerun-if-changed=ui");
}
