#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use scanclip::{ClipOptions, ClipType, Clipper, Error, FillRule, PolyType};

#[derive(Arbitrary, Debug)]
struct Params {
    clip_type: ClipType,
    subj_fill: FillRule,
    clip_fill: FillRule,
    reverse_solution: bool,
    strictly_simple: bool,
    preserve_collinear: bool,
}

fn run(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let params = Params::arbitrary(u)?;
    let subject = scanclip::arbitrary::paths(6, 12, u)?;
    let clip = scanclip::arbitrary::paths(6, 12, u)?;

    let mut clipper = Clipper::with_options(ClipOptions {
        reverse_solution: params.reverse_solution,
        strictly_simple: params.strictly_simple,
        preserve_collinear: params.preserve_collinear,
    });
    clipper.add_paths(&subject, PolyType::Subject, true).unwrap();
    clipper.add_paths(&clip, PolyType::Clip, true).unwrap();

    let flat = clipper.execute(params.clip_type, params.subj_fill, params.clip_fill);
    let tree = clipper.execute_tree(params.clip_type, params.subj_fill, params.clip_fill);
    match (flat, tree) {
        (Ok(flat), Ok(tree)) => {
            assert_eq!(flat.len(), tree.closed_paths().len());
            for n in tree.iter() {
                assert!(tree.contour(n).len() >= 3);
            }
        }
        (Err(Error::IntersectionOrder), _) | (_, Err(Error::IntersectionOrder)) => {}
        (flat, tree) => panic!("unexpected results {flat:?} {tree:?}"),
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let _ = run(&mut Unstructured::new(data));
});
