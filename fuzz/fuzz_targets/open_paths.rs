#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use scanclip::{ClipType, Clipper, Error, FillRule, PolyType};

fn run(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let clip_type = ClipType::arbitrary(u)?;
    let fill = FillRule::arbitrary(u)?;
    let lines = scanclip::arbitrary::paths(4, 8, u)?;
    let clip = scanclip::arbitrary::paths(4, 8, u)?;

    let mut clipper = Clipper::new();
    clipper.add_paths(&lines, PolyType::Subject, false).unwrap();
    clipper.add_paths(&clip, PolyType::Clip, true).unwrap();

    match clipper.execute_tree(clip_type, fill, fill) {
        Ok(tree) => {
            for &n in tree.children() {
                if tree[n].is_open() {
                    assert!(tree.contour(n).len() >= 2);
                    assert_eq!(tree[n].child_count(), 0);
                }
            }
        }
        Err(Error::IntersectionOrder) => {}
        Err(e) => panic!("unexpected error {e}"),
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let _ = run(&mut Unstructured::new(data));
});
