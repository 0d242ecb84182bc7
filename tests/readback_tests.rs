//! Buffered-readback latency contract (spec §8 scenario 7): writing
//! `[v0, v1, v2]` across three submits, a read right after submit `k`
//! returns the value written `N` submits earlier, or nothing if `k < N`.

use nightforge::readback::ReadbackLatencyModel;

#[test]
fn reads_track_exactly_n_frames_behind_the_write() {
    const N: usize = 2;
    let mut model = ReadbackLatencyModel::new(N);
    let writes = ["v0", "v1", "v2", "v3", "v4"];
    for v in writes {
        model.write(v);
    }

    for k in 0..writes.len() {
        let expected = if k < N { None } else { Some(&writes[k - N]) };
        assert_eq!(model.read_after_submit(k), expected, "k={k}");
    }
}

#[test]
fn a_buffered_frame_count_of_one_sees_the_immediately_prior_write() {
    let mut model = ReadbackLatencyModel::new(1);
    model.write("a");
    model.write("b");
    assert_eq!(model.read_after_submit(0), None);
    assert_eq!(model.read_after_submit(1), Some(&"a"));
    assert_eq!(model.read_after_submit(2), Some(&"b"));
}
