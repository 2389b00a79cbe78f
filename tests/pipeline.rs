use approx::assert_relative_eq;
use bkgeff::{
    efficiency::EFFICIENCY_NAME,
    pipeline::BKG_PER_EVENT_NAME,
    prelude::*,
    toy::{Toy, ToyConfig, ToyConfigBuilder},
};

const EFFICIENCIES: [f64; 5] = [0.1, 0.2, 0.3, 0.4, 0.5];

fn log_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config(channel: Channel, fluctuate: bool) -> ToyConfig {
    ToyConfigBuilder::default()
        .channel(channel)
        .efficiency(EFFICIENCIES.to_vec())
        .fluctuate(fluctuate)
        .seed(42)
        .build()
        .unwrap()
}

// write the toy archives and read them back like the command line tool
fn stored_inputs(channel: Channel, toy: &Toy, compression: Option<Compression>) -> Inputs {
    let dir = tempfile::tempdir().unwrap();
    let sig_path = dir.path().join("signal.yaml");
    let bkg_path = dir.path().join("background.yaml");
    toy.signal.write_to(&sig_path, compression).unwrap();
    toy.background.write_to(&bkg_path, compression).unwrap();
    let signal = Archive::read_from(&sig_path).unwrap();
    let background = Archive::read_from(&bkg_path).unwrap();
    Inputs::load(channel, &signal, &background).unwrap()
}

#[test]
fn expected_inputs() {
    log_init();
    let channel = Channel::JpsiToEE;
    let config = config(channel, false);
    let toy = config.generate().unwrap();
    let inputs = stored_inputs(channel, &toy, None);
    assert_eq!(inputs.nevents(), 1e6);

    let output = Pipeline::builder()
        .channel(channel)
        .build()
        .run(&inputs)
        .unwrap();

    assert_eq!(output.pt_edges, [0., 2., 4., 6., 8., 10.]);
    assert_eq!(output.bins.len(), 5);
    assert_eq!(output.efficiency.nbins(), 5);
    assert_eq!(output.bkg_per_event.nbins(), 5);
    assert_eq!(output.efficiency.name, EFFICIENCY_NAME);
    assert_eq!(output.bkg_per_event.name, BKG_PER_EVENT_NAME);

    for (bin, report) in output.bins.iter().enumerate() {
        assert_relative_eq!(output.efficiency.content(bin), EFFICIENCIES[bin], max_relative = 1e-9);
        assert_relative_eq!(report.signal.par[1], channel.resonance_mass(), max_relative = 1e-6);
        assert_relative_eq!(report.signal.par[2], 0.02, max_relative = 1e-6);
        assert_relative_eq!(report.window.width(), 6. * 0.02, max_relative = 1e-6);

        // a flat background never needs more than the initial degree
        assert_eq!(report.background.degree(), 2);
        let expected = config.expected_bkg_per_event(report.window.width());
        assert_relative_eq!(report.bkg_per_event, expected, max_relative = 1e-6);
        assert_eq!(output.bkg_per_event.content(bin), report.bkg_per_event);
        assert_eq!(output.bkg_per_event.error(bin), 0.);
    }
}

#[test]
fn fluctuated_inputs() {
    log_init();
    let channel = Channel::XToPiPiEE;
    let config = config(channel, true);
    let toy = config.generate().unwrap();
    let inputs = stored_inputs(channel, &toy, Some(Compression::Zstd(3)));

    let output = Pipeline::builder()
        .channel(channel)
        .build()
        .run(&inputs)
        .unwrap();
    assert_eq!(output.bins.len(), 5);
    for (bin, report) in output.bins.iter().enumerate() {
        assert_relative_eq!(output.efficiency.content(bin), EFFICIENCIES[bin], max_relative = 0.05);
        assert_relative_eq!(report.signal.par[2], 0.02, max_relative = 0.05);
        let expected = config.expected_bkg_per_event(report.window.width());
        assert_relative_eq!(report.bkg_per_event, expected, max_relative = 0.15);
    }
}

#[test]
fn written_results() {
    log_init();
    let channel = Channel::JpsiToMuMu;
    let toy = config(channel, false).generate().unwrap();
    let inputs = stored_inputs(channel, &toy, Some(Compression::Gzip(6)));
    let output = Pipeline::builder()
        .channel(channel)
        .build()
        .run(&inputs)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let files = ResultWriter::builder()
        .outdir(dir.path())
        .compression(Some(Compression::Bzip2))
        .build()
        .write(channel, &output)
        .unwrap();
    assert_eq!(files.efficiency, dir.path().join("efficiency_jpsiToMuMu.yaml.bz2"));
    assert_eq!(
        files.bkg_per_event,
        dir.path().join("bkgPerEvents_jpsiToMuMu.yaml.bz2")
    );

    let eff = Archive::read_from(&files.efficiency).unwrap();
    assert_eq!(eff.len(), 1);
    assert_eq!(eff.h1(EFFICIENCY_NAME).unwrap(), &output.efficiency);

    let bkg = Archive::read_from(&files.bkg_per_event).unwrap();
    assert_eq!(bkg.len(), 1);
    let read = bkg.h1(BKG_PER_EVENT_NAME).unwrap();
    assert_eq!(read.axis().edges(), output.pt_edges.as_slice());
    assert_eq!(read, &output.bkg_per_event);
}

#[test]
fn mismatched_pt_binning() {
    log_init();
    let channel = Channel::JpsiToEE;
    let sig_toy = config(channel, false).generate().unwrap();
    let bkg_toy = ToyConfigBuilder::default()
        .channel(channel)
        .pt_edges(vec![0., 2., 4., 6., 8., 12.])
        .build()
        .unwrap()
        .generate()
        .unwrap();
    let inputs = Inputs::load(channel, &sig_toy.signal, &bkg_toy.background).unwrap();
    let err = Pipeline::builder()
        .channel(channel)
        .build()
        .run(&inputs)
        .unwrap_err();
    assert!(matches!(err, PipelineError::PtEdgeMismatch));
}
