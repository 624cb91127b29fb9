use orbital_portfolio::run;

fn main() {
    pollster::block_on(run());
}
